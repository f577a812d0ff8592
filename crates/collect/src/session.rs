//! SessionCollector — reads an external session registry directory.
//!
//! The registry's file format is opaque beyond "one JSON-encoded [`Session`]
//! per file"; external tools (editors, agents) are responsible for writing
//! and heartbeating their own entries.

use crate::{CollectError, Collector, SharedStore};
use async_trait::async_trait;
use grove_core::{Clock, Session, SystemClock};
use grove_store::Commit;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct SessionCollector {
    registry_dir: PathBuf,
    ttl: Duration,
    interval: Duration,
}

impl SessionCollector {
    pub fn new(registry_dir: PathBuf) -> Self {
        Self {
            registry_dir,
            ttl: Duration::from_secs(90),
            interval: Duration::from_secs(2),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl Collector for SessionCollector {
    fn name(&self) -> &str {
        "session"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn collect(&self, ctx: &CancellationToken, store: &SharedStore) -> Result<(), CollectError> {
        if ctx.is_cancelled() {
            return Ok(());
        }

        let now = SystemClock.epoch_ms();
        let ttl_ms = self.ttl.as_millis() as u64;
        let sessions = read_sessions(&self.registry_dir, now, ttl_ms)?;
        let scanned = sessions.len() as u64;

        store.apply(self.name(), grove_core::UpdateType::Sessions, Some(scanned), move |draft| {
            let known_workspaces: std::collections::HashSet<&str> =
                draft.workspaces.iter().map(|w| w.id.as_str()).collect();
            draft.sessions = sessions
                .into_iter()
                .map(|mut session| {
                    if !session.workspace_id.is_empty() && !known_workspaces.contains(session.workspace_id.as_str()) {
                        session.workspace_id.clear();
                    }
                    session
                })
                .collect();
            Commit::Apply
        });

        Ok(())
    }
}

fn read_sessions(dir: &std::path::Path, now_ms: u64, ttl_ms: u64) -> Result<Vec<Session>, CollectError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut sessions = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let contents = match std::fs::read_to_string(entry.path()) {
            Ok(c) => c,
            Err(_) => continue,
        };
        let session: Session = match serde_json::from_str(&contents) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "malformed session file");
                continue;
            }
        };
        if !session.is_stale(now_ms, ttl_ms) {
            sessions.push(session);
        }
    }
    Ok(sessions)
}
