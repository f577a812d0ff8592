//! Where a workspace's plan/note files live.
//!
//! Like workspace discovery, the exact directory layout is treated as an
//! opaque capability behind [`NotebookLocator`]; the shipped implementation
//! uses fixed subdirectory names.

use std::path::{Path, PathBuf};

pub trait NotebookLocator: Send + Sync {
    fn plans_dir(&self, workspace_path: &Path) -> PathBuf;
    fn notes_dir(&self, workspace_path: &Path) -> PathBuf;
}

pub struct FsNotebookLocator;

impl NotebookLocator for FsNotebookLocator {
    fn plans_dir(&self, workspace_path: &Path) -> PathBuf {
        workspace_path.join("plans")
    }

    fn notes_dir(&self, workspace_path: &Path) -> PathBuf {
        workspace_path.join("notes")
    }
}

/// Number of regular files directly under `dir`, or 0 if `dir` doesn't
/// exist.
pub fn count_files(dir: &Path) -> std::io::Result<u64> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let mut count = 0;
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}
