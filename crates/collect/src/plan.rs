//! PlanCollector — counts plan files per workspace.

use crate::notebook::{count_files, FsNotebookLocator, NotebookLocator};
use crate::{CollectError, Collector, SharedStore};
use async_trait::async_trait;
use grove_store::Commit;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct PlanCollector<L: NotebookLocator = FsNotebookLocator> {
    locator: L,
    interval: Duration,
}

impl PlanCollector<FsNotebookLocator> {
    pub fn new() -> Self {
        Self::with_locator(FsNotebookLocator, Duration::from_secs(30))
    }
}

impl Default for PlanCollector<FsNotebookLocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: NotebookLocator> PlanCollector<L> {
    pub fn with_locator(locator: L, interval: Duration) -> Self {
        Self { locator, interval }
    }
}

#[async_trait]
impl<L: NotebookLocator> Collector for PlanCollector<L> {
    fn name(&self) -> &str {
        "plan"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn collect(&self, ctx: &CancellationToken, store: &SharedStore) -> Result<(), CollectError> {
        if ctx.is_cancelled() {
            return Ok(());
        }

        let workspaces = store.get_workspaces();
        let mut counts = Vec::with_capacity(workspaces.len());
        for workspace in workspaces.iter() {
            let dir = self.locator.plans_dir(&workspace.path);
            counts.push((workspace.id.clone(), count_files(&dir)?));
        }
        let scanned = counts.len() as u64;

        store.apply(self.name(), grove_core::UpdateType::Other("plan".into()), Some(scanned), move |draft| {
            for (id, count) in &counts {
                if let Some(workspace) = draft.workspaces.iter_mut().find(|w| &w.id == id) {
                    workspace.plan_count = *count;
                }
            }
            Commit::Apply
        });

        Ok(())
    }
}
