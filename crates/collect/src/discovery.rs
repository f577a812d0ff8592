//! Workspace discovery.
//!
//! What counts as "a workspace" and where to look for one is treated as an
//! opaque capability: the shipped [`FsWalkDiscovery`] implementation walks
//! a fixed set of root directories looking for `grove.yml` markers and
//! `.git` entries, but any implementation of [`WorkspaceDiscovery`] can be
//! substituted (including, in tests, a fixed fixture).

use grove_core::WorkspaceKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One workspace found during a discovery pass, before it is merged into
/// the store's workspace records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredWorkspace {
    pub path: PathBuf,
    pub name: String,
    pub kind: WorkspaceKind,
    pub parent_project_path: Option<PathBuf>,
    pub parent_ecosystem_path: Option<PathBuf>,
    pub root_ecosystem_path: Option<PathBuf>,
}

pub trait WorkspaceDiscovery: Send + Sync {
    fn discover(&self, roots: &[PathBuf]) -> Vec<DiscoveredWorkspace>;
}

/// Marker filename identifying a grove-managed workspace root.
pub const WORKSPACE_MARKER: &str = "grove.yml";

/// Walks each root looking for directories that carry a `grove.yml`
/// marker or a `.git` entry (worktree link file or plain repo directory).
pub struct FsWalkDiscovery {
    pub max_depth: usize,
}

impl Default for FsWalkDiscovery {
    fn default() -> Self {
        Self { max_depth: 6 }
    }
}

impl WorkspaceDiscovery for FsWalkDiscovery {
    fn discover(&self, roots: &[PathBuf]) -> Vec<DiscoveredWorkspace> {
        let mut found = Vec::new();
        for root in roots {
            for entry in WalkDir::new(root)
                .max_depth(self.max_depth)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_dir() {
                    continue;
                }
                let dir = entry.path();
                if let Some(workspace) = classify(dir, root) {
                    found.push(workspace);
                }
            }
        }
        found
    }
}

fn classify(dir: &Path, root: &Path) -> Option<DiscoveredWorkspace> {
    let has_marker = dir.join(WORKSPACE_MARKER).is_file();
    let git_entry = dir.join(".git");
    let has_git = git_entry.exists();
    if !has_marker && !has_git {
        return None;
    }

    let kind = if git_entry.is_file() {
        // `.git` is a file (not a directory) in a linked worktree.
        WorkspaceKind::Worktree
    } else if has_marker {
        WorkspaceKind::Ecosystem
    } else {
        WorkspaceKind::Project
    };

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Some(DiscoveredWorkspace {
        path: dir.to_path_buf(),
        name,
        kind,
        parent_project_path: None,
        parent_ecosystem_path: None,
        root_ecosystem_path: if dir == root { None } else { Some(root.to_path_buf()) },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovers_git_repo_as_project() {
        let dir = tempdir().unwrap();
        let repo = dir.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        let found = FsWalkDiscovery::default().discover(&[dir.path().to_path_buf()]);
        assert!(found.iter().any(|w| w.path == repo && w.kind == WorkspaceKind::Project));
    }

    #[test]
    fn discovers_grove_marker_as_ecosystem() {
        let dir = tempdir().unwrap();
        let eco = dir.path().join("eco");
        fs::create_dir_all(&eco).unwrap();
        fs::write(eco.join("grove.yml"), "").unwrap();

        let found = FsWalkDiscovery::default().discover(&[dir.path().to_path_buf()]);
        assert!(found.iter().any(|w| w.path == eco && w.kind == WorkspaceKind::Ecosystem));
    }

    #[test]
    fn worktree_link_file_is_classified_as_worktree() {
        let dir = tempdir().unwrap();
        let wt = dir.path().join("wt");
        fs::create_dir_all(&wt).unwrap();
        fs::write(wt.join(".git"), "gitdir: /elsewhere/.git/worktrees/wt\n").unwrap();

        let found = FsWalkDiscovery::default().discover(&[dir.path().to_path_buf()]);
        assert!(found.iter().any(|w| w.path == wt && w.kind == WorkspaceKind::Worktree));
    }

    #[test]
    fn plain_directory_without_markers_is_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("plain")).unwrap();

        let found = FsWalkDiscovery::default().discover(&[dir.path().to_path_buf()]);
        assert!(found.is_empty());
    }
}
