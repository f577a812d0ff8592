//! GitStatusCollector — per-workspace git branch/ahead-behind/dirty state.

use crate::{CollectError, Collector, SharedStore};
use async_trait::async_trait;
use git2::{Repository, Status, StatusOptions};
use grove_core::{GitStatus, WorkspaceId};
use grove_store::Commit;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct GitStatusCollector {
    interval: Duration,
}

impl GitStatusCollector {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for GitStatusCollector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl Collector for GitStatusCollector {
    fn name(&self) -> &str {
        "git"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn collect(&self, ctx: &CancellationToken, store: &SharedStore) -> Result<(), CollectError> {
        if ctx.is_cancelled() {
            return Ok(());
        }

        let workspaces = store.get_workspaces();
        let mut statuses: HashMap<WorkspaceId, GitStatus> = HashMap::new();
        for workspace in workspaces.iter() {
            if ctx.is_cancelled() {
                return Ok(());
            }
            match git_status_for(&workspace.path) {
                Ok(Some(status)) => {
                    statuses.insert(workspace.id.clone(), status);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(workspace = %workspace.id, error = %e, "git status failed");
                }
            }
        }

        let scanned = statuses.len() as u64;
        store.apply(self.name(), grove_core::UpdateType::Other("git".into()), Some(scanned), move |draft| {
            for workspace in draft.workspaces.iter_mut() {
                if let Some(status) = statuses.remove(&workspace.id) {
                    workspace.git = Some(status);
                }
            }
            Commit::Apply
        });

        Ok(())
    }
}

/// Returns `Ok(None)` if `path` is not a git repository at all (not every
/// workspace is one).
fn git_status_for(path: &Path) -> Result<Option<GitStatus>, CollectError> {
    let repo = match Repository::open(path) {
        Ok(repo) => repo,
        Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let head = repo.head().ok();
    let branch = head
        .as_ref()
        .and_then(|h| h.shorthand())
        .unwrap_or("")
        .to_string();
    let head_commit = head
        .as_ref()
        .and_then(|h| h.peel_to_commit().ok())
        .map(|c| c.id().to_string())
        .unwrap_or_default();

    let (has_upstream, ahead, behind) = head
        .as_ref()
        .filter(|h| h.is_branch())
        .and_then(|h| git2::Branch::wrap(h.resolve().ok()?).upstream().ok())
        .and_then(|upstream| {
            let local_oid = repo.head().ok()?.target()?;
            let upstream_oid = upstream.get().target()?;
            repo.graph_ahead_behind(local_oid, upstream_oid).ok()
        })
        .map(|(ahead, behind)| (true, ahead as u64, behind as u64))
        .unwrap_or((false, 0, 0));

    let mut opts = StatusOptions::new();
    opts.include_untracked(true).include_ignored(false);
    let mut staged = 0u64;
    let mut modified = 0u64;
    let mut untracked = 0u64;
    for entry in repo.statuses(Some(&mut opts))?.iter() {
        let flags = entry.status();
        if flags.intersects(
            Status::INDEX_NEW
                | Status::INDEX_MODIFIED
                | Status::INDEX_DELETED
                | Status::INDEX_RENAMED
                | Status::INDEX_TYPECHANGE,
        ) {
            staged += 1;
        }
        if flags.intersects(
            Status::WT_MODIFIED | Status::WT_DELETED | Status::WT_RENAMED | Status::WT_TYPECHANGE,
        ) {
            modified += 1;
        }
        if flags.contains(Status::WT_NEW) {
            untracked += 1;
        }
    }

    Ok(Some(GitStatus::new(
        branch,
        has_upstream,
        ahead,
        behind,
        staged,
        modified,
        untracked,
        head_commit,
    )))
}
