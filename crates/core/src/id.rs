//! Identifier types.
//!
//! [`WorkspaceId`] is derived deterministically from a workspace's
//! canonical filesystem path, so re-discovering the same workspace across
//! collector passes (or daemon restarts) always yields the same id.
//! [`SessionId`] has no stable external identity to derive from, so it is
//! randomly generated the way the teacher generates its job-family ids.

use std::path::Path;

/// Stable identifier for a workspace, derived from its canonical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    /// Derive an id from an already-canonicalized path.
    ///
    /// Callers are expected to have resolved symlinks via
    /// [`std::fs::canonicalize`] first, since the id's stability across
    /// runs depends on always seeing the same (canonical) path for the
    /// same workspace.
    pub fn from_canonical_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WorkspaceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for WorkspaceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier for a live session, reported by an external tool into the
/// session registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(format!("ses-{}", nanoid::nanoid!(16)))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn workspace_id_is_stable_for_same_path() {
        let path = PathBuf::from("/home/user/code/grove");
        assert_eq!(
            WorkspaceId::from_canonical_path(&path),
            WorkspaceId::from_canonical_path(&path)
        );
    }

    #[test]
    fn workspace_id_differs_for_different_paths() {
        let a = WorkspaceId::from_canonical_path(Path::new("/a"));
        let b = WorkspaceId::from_canonical_path(Path::new("/b"));
        assert_ne!(a, b);
    }

    #[test]
    fn session_id_new_has_prefix() {
        let id = SessionId::new();
        assert!(id.as_str().starts_with("ses-"));
    }
}
