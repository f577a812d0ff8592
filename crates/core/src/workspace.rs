//! Workspace records and their git status sub-record.

use crate::id::WorkspaceId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The shape of a discovered workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspaceKind {
    Project,
    Ecosystem,
    Worktree,
    EcosystemSubProject,
}

/// One project or worktree known to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub path: PathBuf,
    pub name: String,
    pub kind: WorkspaceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_project_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_ecosystem_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_ecosystem_path: Option<PathBuf>,
    pub git: Option<GitStatus>,
    pub plan_count: u64,
    pub note_count: u64,
    pub chat_count: u64,
    pub last_seen_at: u64,
}

impl Workspace {
    /// A freshly-discovered workspace with no git/plan/note data yet.
    pub fn new(id: WorkspaceId, path: PathBuf, name: String, kind: WorkspaceKind, seen_at: u64) -> Self {
        Self {
            id,
            path,
            name,
            kind,
            parent_project_path: None,
            parent_ecosystem_path: None,
            root_ecosystem_path: None,
            git: None,
            plan_count: 0,
            note_count: 0,
            chat_count: 0,
            last_seen_at: seen_at,
        }
    }
}

/// Per-workspace git state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatus {
    pub branch: String,
    pub has_upstream: bool,
    pub ahead: u64,
    pub behind: u64,
    pub staged: u64,
    pub modified: u64,
    pub untracked: u64,
    pub is_dirty: bool,
    pub head_commit: String,
}

impl GitStatus {
    pub fn new(
        branch: String,
        has_upstream: bool,
        ahead: u64,
        behind: u64,
        staged: u64,
        modified: u64,
        untracked: u64,
        head_commit: String,
    ) -> Self {
        Self {
            branch,
            has_upstream,
            ahead,
            behind,
            staged,
            modified,
            untracked,
            is_dirty: staged + modified + untracked > 0,
            head_commit,
        }
    }
}
