#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! grove-client: a thin, purpose-built client for one daemon's wire
//! format. Connects directly to its Unix socket over HTTP/2 cleartext; no
//! connection pooling, no TLS, no general-purpose HTTP machinery.

use bytes::Bytes;
use grove_core::{RunningConfig, StateSnapshot, UpdateEvent};
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http2;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {path}: {source}")]
    Connect { path: PathBuf, source: std::io::Error },

    #[error("http/2 handshake failed: {0}")]
    Handshake(hyper::Error),

    #[error("request failed: {0}")]
    Request(hyper::Error),

    #[error("server returned {0}")]
    Status(hyper::StatusCode),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request timed out")]
    Timeout,
}

pub struct Client {
    socket_path: PathBuf,
}

impl Client {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into() }
    }

    /// `GET /health` with a 1s timeout. Any connection error, timeout, or
    /// non-2xx response is treated as "not running" rather than propagated.
    pub async fn is_running(&self) -> bool {
        tokio::time::timeout(Duration::from_secs(1), self.get_bytes("/health")).await.map(Result::ok).ok().flatten().is_some()
    }

    pub async fn get_state(&self) -> Result<StateSnapshot, ClientError> {
        let body = self.get_bytes("/api/state").await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn get_config(&self) -> Result<RunningConfig, ClientError> {
        let body = self.get_bytes("/api/config").await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Opens `/api/stream`, spawns a reader that parses one `UpdateEvent`
    /// per NDJSON line, and forwards it on the returned channel. The
    /// channel closes when `ctx` is cancelled or the server disconnects.
    pub async fn stream_state(&self, ctx: CancellationToken) -> Result<mpsc::Receiver<UpdateEvent>, ClientError> {
        let mut sender = self.connect().await?;
        let request = Request::builder()
            .method("GET")
            .uri("/api/stream")
            .body(Empty::<Bytes>::new())
            .map_err(|e| ClientError::Connect { path: self.socket_path.clone(), source: std::io::Error::other(e) })?;

        let response = sender.send_request(request).await.map_err(ClientError::Request)?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(read_ndjson_stream(response.into_body(), tx, ctx));
        Ok(rx)
    }

    pub fn close(&self) {
        // No pooled connections to release: every request opens and tears
        // down its own UnixStream, so this exists for API symmetry only.
    }

    async fn get_bytes(&self, path: &str) -> Result<Bytes, ClientError> {
        let mut sender = self.connect().await?;
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Empty::<Bytes>::new())
            .map_err(|e| ClientError::Connect { path: self.socket_path.clone(), source: std::io::Error::other(e) })?;

        let response = sender.send_request(request).await.map_err(ClientError::Request)?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.into_body().collect().await.map_err(ClientError::Request)?.to_bytes())
    }

    async fn connect(&self) -> Result<http2::SendRequest<Empty<Bytes>>, ClientError> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| ClientError::Connect { path: self.socket_path.clone(), source: e })?;
        let io = TokioIo::new(stream);

        let (sender, conn) = http2::Builder::new(TokioExecutor::new())
            .handshake(io)
            .await
            .map_err(ClientError::Handshake)?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "grove client connection closed");
            }
        });

        Ok(sender)
    }
}

async fn read_ndjson_stream(
    mut body: hyper::body::Incoming,
    tx: mpsc::Sender<UpdateEvent>,
    ctx: CancellationToken,
) {
    let mut buf = Vec::new();
    loop {
        tokio::select! {
            _ = ctx.cancelled() => return,
            frame = body.frame() => {
                let Some(frame) = frame else { return };
                let Ok(frame) = frame else { return };
                let Some(data) = frame.into_data().ok() else { continue };
                buf.extend_from_slice(&data);

                while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    let line = &line[..line.len() - 1];
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_slice::<UpdateEvent>(line) {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping malformed stream line");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::SystemClock;
    use grove_store::Store;
    use tempfile::tempdir;

    async fn spawn_server(socket_path: PathBuf) -> (CancellationToken, tokio::task::JoinHandle<()>) {
        let store = std::sync::Arc::new(Store::<SystemClock>::new());
        let config = RunningConfig::from_config(&grove_core::Config::default(), 0);
        let ctx = CancellationToken::new();
        let ctx_clone = ctx.clone();
        let handle = tokio::spawn(async move {
            grove_server::listen_and_serve(&socket_path, store, config, ctx_clone, Duration::from_millis(200))
                .await
                .unwrap();
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        (ctx, handle)
    }

    #[tokio::test]
    async fn is_running_true_against_a_live_server() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("daemon.sock");
        let (ctx, handle) = spawn_server(socket_path.clone()).await;

        let client = Client::new(socket_path);
        assert!(client.is_running().await);

        ctx.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn is_running_false_when_nothing_listens() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("daemon.sock");
        let client = Client::new(socket_path);
        assert!(!client.is_running().await);
    }

    #[tokio::test]
    async fn get_state_returns_the_empty_snapshot() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("daemon.sock");
        let (ctx, handle) = spawn_server(socket_path.clone()).await;

        let client = Client::new(socket_path);
        let state = client.get_state().await.unwrap();
        assert_eq!(state.revision, 0);

        ctx.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn stream_state_yields_the_initial_event() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("daemon.sock");
        let (ctx, handle) = spawn_server(socket_path.clone()).await;

        let client = Client::new(socket_path);
        let mut rx = client.stream_state(CancellationToken::new()).await.unwrap();
        let event = rx.recv().await.expect("initial event");
        assert_eq!(event.update_type, grove_core::UpdateType::Initial);

        ctx.cancel();
        handle.await.unwrap();
    }
}
