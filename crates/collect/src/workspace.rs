//! WorkspaceCollector — periodically rediscovers the set of workspaces.

use crate::discovery::{FsWalkDiscovery, WorkspaceDiscovery};
use crate::{CollectError, Collector, SharedStore};
use async_trait::async_trait;
use grove_core::{Clock, SystemClock, Workspace, WorkspaceId};
use grove_store::Commit;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct WorkspaceCollector<D: WorkspaceDiscovery = FsWalkDiscovery> {
    roots: Vec<PathBuf>,
    discovery: D,
    interval: Duration,
}

impl WorkspaceCollector<FsWalkDiscovery> {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self::with_discovery(roots, FsWalkDiscovery::default(), Duration::from_secs(30))
    }
}

impl<D: WorkspaceDiscovery> WorkspaceCollector<D> {
    pub fn with_discovery(roots: Vec<PathBuf>, discovery: D, interval: Duration) -> Self {
        Self { roots, discovery, interval }
    }
}

#[async_trait]
impl<D: WorkspaceDiscovery> Collector for WorkspaceCollector<D> {
    fn name(&self) -> &str {
        "workspace"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn collect(&self, ctx: &CancellationToken, store: &SharedStore) -> Result<(), CollectError> {
        if ctx.is_cancelled() {
            return Ok(());
        }

        let discovered = self.discovery.discover(&self.roots);
        let scanned = discovered.len() as u64;
        let now = SystemClock.epoch_ms();

        store.apply(self.name(), grove_core::UpdateType::Workspaces, Some(scanned), |draft| {
            let mut existing: HashMap<WorkspaceId, Workspace> = draft
                .workspaces
                .drain(..)
                .map(|w| (w.id.clone(), w))
                .collect();

            let mut next = Vec::with_capacity(discovered.len());
            for found in &discovered {
                let id = WorkspaceId::from_canonical_path(&found.path);
                let mut workspace = existing.remove(&id).unwrap_or_else(|| {
                    Workspace::new(id.clone(), found.path.clone(), found.name.clone(), found.kind, now)
                });
                workspace.name = found.name.clone();
                workspace.kind = found.kind;
                workspace.parent_project_path = found.parent_project_path.clone();
                workspace.parent_ecosystem_path = found.parent_ecosystem_path.clone();
                workspace.root_ecosystem_path = found.root_ecosystem_path.clone();
                workspace.last_seen_at = now;
                next.push(workspace);
            }
            draft.workspaces = next;
            Commit::Apply
        });

        Ok(())
    }
}
