//! Engine — owns the collector set and schedules each one on its own
//! cadence.

use grove_collect::{Collector, SharedStore};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Engine {
    collectors: Vec<Arc<dyn Collector>>,
    store: Arc<SharedStore>,
}

impl Engine {
    pub fn new(store: Arc<SharedStore>) -> Self {
        Self { collectors: Vec::new(), store }
    }

    pub fn register(&mut self, collector: Arc<dyn Collector>) {
        self.collectors.push(collector);
    }

    /// Spawns one scheduler task per registered collector and returns
    /// immediately. Each scheduler runs an immediate first pass, then polls
    /// on the collector's interval until `ctx` is cancelled.
    pub fn start(&self, ctx: CancellationToken) -> Vec<JoinHandle<()>> {
        self.collectors
            .iter()
            .map(|collector| {
                let collector = Arc::clone(collector);
                let store = Arc::clone(&self.store);
                let ctx = ctx.clone();
                tokio::spawn(async move { run_scheduler(collector, store, ctx).await })
            })
            .collect()
    }
}

async fn run_scheduler(collector: Arc<dyn Collector>, store: Arc<SharedStore>, ctx: CancellationToken) {
    loop {
        if ctx.is_cancelled() {
            return;
        }

        if let Err(e) = collector.collect(&ctx, &store).await {
            tracing::warn!(collector = collector.name(), error = %e, "collect pass failed");
        }

        tokio::select! {
            _ = ctx.cancelled() => return,
            _ = tokio::time::sleep(collector.interval()) => {}
        }
    }
}
