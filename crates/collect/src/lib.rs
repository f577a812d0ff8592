//! Collector capability and the core set of concrete collectors.

pub mod discovery;
pub mod git_status;
pub mod notebook;
pub mod plan;
pub mod note;
pub mod session;
pub mod workspace;

pub use discovery::{DiscoveredWorkspace, FsWalkDiscovery, WorkspaceDiscovery};
pub use git_status::GitStatusCollector;
pub use notebook::{FsNotebookLocator, NotebookLocator};
pub use note::NoteCollector;
pub use plan::PlanCollector;
pub use session::SessionCollector;
pub use workspace::WorkspaceCollector;

use async_trait::async_trait;
use grove_core::SystemClock;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// A production store, using the real system clock. Collectors never need
/// a fake clock themselves — their tests exercise the pure discovery/parse
/// logic directly and assert on the `Store` through its own API.
pub type SharedStore = grove_store::Store<SystemClock>;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("{0}")]
    Other(String),
}

/// One pollable source of state.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Stable identifier, used as the `source` field of emitted events.
    fn name(&self) -> &str;

    /// Desired poll cadence; the engine may enforce a floor.
    fn interval(&self) -> Duration;

    /// One pass. Must apply at most one write to `store` and must be
    /// safe to abandon if `ctx` is cancelled mid-flight.
    async fn collect(&self, ctx: &CancellationToken, store: &SharedStore) -> Result<(), CollectError>;
}
