//! Binds the Unix socket, serves the router, and cleans up on the way out.

use crate::router::build_router;
use grove_core::RunningConfig;
use grove_store::Store;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;

type SharedStore = Store<grove_core::SystemClock>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to create directory {path}: {source}")]
    DirCreateFailed { path: PathBuf, source: std::io::Error },

    #[error("failed to bind unix socket at {path}: {source}")]
    BindFailed { path: PathBuf, source: std::io::Error },

    #[error("failed to set permissions on {path}: {source}")]
    PermissionsFailed { path: PathBuf, source: std::io::Error },

    #[error("failed to remove stale socket file {path}: {source}")]
    CleanupFailed { path: PathBuf, source: std::io::Error },

    #[error("server error: {0}")]
    ServeFailed(std::io::Error),
}

/// Binds `socket_path`, serves the router until `ctx` is cancelled, then
/// waits up to `grace` for in-flight requests to finish before tearing
/// down. A stale socket file is always removed before binding: liveness is
/// PidGuard's job, not this function's.
pub async fn listen_and_serve(
    socket_path: &Path,
    store: Arc<SharedStore>,
    config: RunningConfig,
    ctx: CancellationToken,
    grace: Duration,
) -> Result<(), ServerError> {
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ServerError::DirCreateFailed { path: parent.to_path_buf(), source: e })?;
        std::fs::set_permissions(parent, Permissions::from_mode(0o755))
            .map_err(|e| ServerError::PermissionsFailed { path: parent.to_path_buf(), source: e })?;
    }

    if socket_path.exists() {
        std::fs::remove_file(socket_path)
            .map_err(|e| ServerError::CleanupFailed { path: socket_path.to_path_buf(), source: e })?;
    }

    let listener = UnixListener::bind(socket_path)
        .map_err(|e| ServerError::BindFailed { path: socket_path.to_path_buf(), source: e })?;
    std::fs::set_permissions(socket_path, Permissions::from_mode(0o600))
        .map_err(|e| ServerError::PermissionsFailed { path: socket_path.to_path_buf(), source: e })?;

    tracing::info!(path = %socket_path.display(), "grove-server listening");

    let app = build_router(store, config);
    let serving = axum::serve(listener, app).with_graceful_shutdown(ctx.cancelled_owned());

    match tokio::time::timeout(grace, serving).await {
        Ok(result) => result.map_err(ServerError::ServeFailed)?,
        Err(_) => tracing::warn!("shutdown grace period elapsed with requests still in flight"),
    }

    if socket_path.exists() {
        let _ = std::fs::remove_file(socket_path);
    }

    Ok(())
}
