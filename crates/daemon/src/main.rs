//! groved — the grove state daemon.
//!
//! Discovers workspaces, collects their live git/session/plan/note status,
//! and serves point-in-time queries plus a live event stream over a Unix
//! socket.

use grove_collect::{
    FsNotebookLocator, FsWalkDiscovery, GitStatusCollector, NoteCollector, PlanCollector, SessionCollector,
    WorkspaceCollector,
};
use grove_core::{Clock, Config, RunningConfig, SystemClock};
use grove_engine::Engine;
use grove_server::PidGuard;
use grove_store::Store;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    init_logging();

    let config = Config::default();

    let guard = match PidGuard::acquire(&config.pid_path) {
        Ok(guard) => guard,
        Err(grove_server::PidError::AlreadyRunning(pid)) => {
            tracing::error!(pid, "grove daemon already running");
            std::process::exit(2);
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to acquire pidfile");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "grove daemon exited with an error");
        guard.release();
        std::process::exit(1);
    }

    guard.release();
}

async fn run(config: Config) -> Result<(), grove_server::ServerError> {
    let store = Arc::new(Store::<SystemClock>::new());
    let mut engine = Engine::new(Arc::clone(&store));

    let roots = discovery_roots();
    let registry_dir = session_registry_dir(&config);

    engine.register(Arc::new(WorkspaceCollector::with_discovery(
        roots,
        FsWalkDiscovery::default(),
        config.workspace_interval,
    )));
    engine.register(Arc::new(GitStatusCollector::new(config.git_interval)));
    engine.register(Arc::new(
        SessionCollector::new(registry_dir).with_interval(config.session_interval),
    ));
    engine.register(Arc::new(PlanCollector::with_locator(FsNotebookLocator, config.plan_interval)));
    engine.register(Arc::new(NoteCollector::with_locator(FsNotebookLocator, config.note_interval)));

    let running_config = RunningConfig::from_config(&config, SystemClock.epoch_ms());

    let engine_ctx = CancellationToken::new();
    let handles = engine.start(engine_ctx.clone());

    let signal_ctx = engine_ctx.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        signal_ctx.cancel();
    });

    let serve_ctx = engine_ctx.clone();
    let socket_path = config.socket_path.clone();
    let serve_handle = tokio::spawn(async move {
        grove_server::listen_and_serve(&socket_path, store, running_config, serve_ctx, SHUTDOWN_GRACE).await
    });

    // Whether the server returned on its own (startup error) or because a
    // signal cancelled its context, make sure the collectors stop too.
    let result = serve_handle.await.unwrap_or(Ok(()));
    engine_ctx.cancel();
    for handle in handles {
        let _ = handle.await;
    }

    result
}

async fn wait_for_shutdown_signal() {
    let mut terminate = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(signal) => signal,
        Err(e) => {
            tracing::warn!(error = %e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
            unreachable!()
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received interrupt, shutting down");
        }
        _ = terminate.recv() => {
            tracing::info!("received terminate, shutting down");
        }
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("grove=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Where `WorkspaceCollector` looks for workspaces. Not part of the core's
/// configuration surface (it's a filesystem concern of this binary, not of
/// the daemon's wire contract), so it's resolved from `GROVE_ROOTS`
/// (colon-separated) with a fallback to the user's home directory.
fn discovery_roots() -> Vec<PathBuf> {
    if let Some(raw) = std::env::var_os("GROVE_ROOTS") {
        let roots: Vec<PathBuf> = std::env::split_paths(&raw).collect();
        if !roots.is_empty() {
            return roots;
        }
    }
    dirs::home_dir().into_iter().collect()
}

fn session_registry_dir(config: &Config) -> PathBuf {
    config
        .socket_path
        .parent()
        .map(|dir| dir.join("sessions"))
        .unwrap_or_else(|| PathBuf::from("sessions"))
}
