//! HTTP routes served over the daemon's Unix socket.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use grove_core::RunningConfig;
use grove_store::Store;
use std::convert::Infallible;
use std::sync::Arc;

type SharedStore = Store<grove_core::SystemClock>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SharedStore>,
    pub config: RunningConfig,
}

pub fn build_router(store: Arc<SharedStore>, config: RunningConfig) -> Router {
    let state = AppState { store, config };
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/state", get(state_handler))
        .route("/api/workspaces", get(workspaces_handler))
        .route("/api/sessions", get(sessions_handler))
        .route("/api/config", get(config_handler))
        .route("/api/stream", get(stream_handler))
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn state_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.get())
}

async fn workspaces_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.get_workspaces())
}

async fn sessions_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.get_sessions())
}

async fn config_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.config.clone())
}

/// Newline-delimited JSON: one `UpdateEvent` per line, starting with the
/// synthesized `initial` event and continuing for as long as the client
/// stays connected. Dropping the response stream unsubscribes.
async fn stream_handler(State(state): State<AppState>) -> Response {
    let subscription = state.store.subscribe_owned();

    let events = stream::unfold(subscription, |mut sub| async move {
        let event = sub.receiver.recv().await?;
        Some((event, sub))
    });

    let lines = events.map(|event| {
        let mut line = serde_json::to_vec(&event).unwrap_or_default();
        line.push(b'\n');
        Ok::<_, Infallible>(Bytes::from(line))
    });

    let body = axum::body::Body::from_stream(lines);
    Response::builder()
        .status(200)
        .header("content-type", "application/x-ndjson")
        .body(body)
        .unwrap_or_else(|_| Response::new(axum::body::Body::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_core::Config;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_config() -> RunningConfig {
        RunningConfig::from_config(&Config::default(), 0)
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let store = Arc::new(Store::<grove_core::SystemClock>::new());
        let app = build_router(store, test_config());

        let response = app
            .oneshot(axum::http::Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn state_returns_empty_snapshot_json() {
        let store = Arc::new(Store::<grove_core::SystemClock>::new());
        let app = build_router(store, test_config());

        let response = app
            .oneshot(axum::http::Request::builder().uri("/api/state").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["revision"], 0);
        assert_eq!(json["workspaces"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn config_reports_intervals_as_human_readable_strings() {
        let store = Arc::new(Store::<grove_core::SystemClock>::new());
        let app = build_router(store, test_config());

        let response = app
            .oneshot(axum::http::Request::builder().uri("/api/config").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["git_interval"], "10s");
    }

    #[tokio::test]
    async fn stream_emits_initial_event_first() {
        let store = Arc::new(Store::<grove_core::SystemClock>::new());
        let app = build_router(Arc::clone(&store), test_config());

        let response = app
            .oneshot(axum::http::Request::builder().uri("/api/stream").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        // The stream never ends on its own (it waits on the next store
        // write), so read just the first frame instead of the whole body.
        let mut body = response.into_body();
        let frame = tokio::time::timeout(std::time::Duration::from_secs(1), body.frame())
            .await
            .expect("first frame did not arrive")
            .expect("stream ended before any frame")
            .expect("frame error");
        let data = frame.into_data().expect("expected a data frame");
        let json: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(json["update_type"], "initial");
    }
}
