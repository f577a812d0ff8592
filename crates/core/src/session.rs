//! Session records — live agent/editor sessions observed on this host.

use crate::id::SessionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// May be empty if the session isn't bound to a known workspace.
    #[serde(default)]
    pub workspace_id: String,
    /// Free-form tag, e.g. "editor", "agent".
    pub kind: String,
    pub started_at: u64,
    pub last_heartbeat_at: u64,
}

impl Session {
    pub fn is_stale(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_heartbeat_at) > ttl_ms
    }
}
