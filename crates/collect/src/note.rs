//! NoteCollector — counts note files per workspace.

use crate::notebook::{count_files, FsNotebookLocator, NotebookLocator};
use crate::{CollectError, Collector, SharedStore};
use async_trait::async_trait;
use grove_store::Commit;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct NoteCollector<L: NotebookLocator = FsNotebookLocator> {
    locator: L,
    interval: Duration,
}

impl NoteCollector<FsNotebookLocator> {
    pub fn new() -> Self {
        Self::with_locator(FsNotebookLocator, Duration::from_secs(60))
    }
}

impl Default for NoteCollector<FsNotebookLocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: NotebookLocator> NoteCollector<L> {
    pub fn with_locator(locator: L, interval: Duration) -> Self {
        Self { locator, interval }
    }
}

#[async_trait]
impl<L: NotebookLocator> Collector for NoteCollector<L> {
    fn name(&self) -> &str {
        "note"
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
            let dir = self.locator.notes_dir(&workspace.path);
            counts.push((workspace.id.clone(), count_files(&dir)?));
        }
        let scanned = counts.len() as u64;

        store.apply(self.name(), grove_core::UpdateType::Other("note".into()), Some(scanned), move |draft| {
            for (id, count) in &counts {
                if let Some(workspace) = draft.workspaces.iter_mut().find(|w| &w.id == id) {
                    workspace.note_count = *count;
                }
            }
            Commit::Apply
        });

        Ok(())
    }
}
