//! StateSnapshot — the aggregate served to clients and broadcast on change.

use crate::id::WorkspaceId;
use crate::session::Session;
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable, cheaply-cloneable view of the daemon's full state.
///
/// Every field is `Arc`-backed so that handing a snapshot to a reader, or
/// publishing a new one after a write, is a pointer copy rather than a deep
/// clone of the workspace/session vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub revision: u64,
    pub updated_at: u64,
    pub workspaces: Arc<Vec<Workspace>>,
    pub sessions: Arc<Vec<Session>>,
    pub focus: Arc<Vec<WorkspaceId>>,
}

impl StateSnapshot {
    pub fn empty() -> Self {
        Self {
            revision: 0,
            updated_at: 0,
            workspaces: Arc::new(Vec::new()),
            sessions: Arc::new(Vec::new()),
            focus: Arc::new(Vec::new()),
        }
    }

    pub fn workspace(&self, id: &WorkspaceId) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| &w.id == id)
    }
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// A mutable draft handed to an [`apply`](crate) mutator closure.
///
/// `revision`/`updated_at` are not writable directly — the Store stamps
/// them after a commit — so the draft only exposes the entity vectors.
#[derive(Debug, Default)]
pub struct Draft {
    pub workspaces: Vec<Workspace>,
    pub sessions: Vec<Session>,
    pub focus: Vec<WorkspaceId>,
}

impl Draft {
    pub fn from_snapshot(snapshot: &StateSnapshot) -> Self {
        Self {
            workspaces: (*snapshot.workspaces).clone(),
            sessions: (*snapshot.sessions).clone(),
            focus: (*snapshot.focus).clone(),
        }
    }

    pub fn into_snapshot(self, revision: u64, updated_at: u64) -> StateSnapshot {
        StateSnapshot {
            revision,
            updated_at,
            workspaces: Arc::new(self.workspaces),
            sessions: Arc::new(self.sessions),
            focus: Arc::new(self.focus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_has_zero_revision() {
        let s = StateSnapshot::empty();
        assert_eq!(s.revision, 0);
        assert!(s.workspaces.is_empty());
    }

    #[test]
    fn draft_round_trips_through_snapshot() {
        let snapshot = StateSnapshot::empty();
        let draft = Draft::from_snapshot(&snapshot);
        let next = draft.into_snapshot(1, 42);
        assert_eq!(next.revision, 1);
        assert_eq!(next.updated_at, 42);
    }
}
