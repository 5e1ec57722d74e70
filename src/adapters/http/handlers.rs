//! HTTP handlers for the command channel, static assets and health.

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::application::BridgeStatus;
use crate::ports::AssetError;

use super::dto::HealthResponse;
use super::state::{AppState, HealthState};

const NOT_FOUND_BODY: &str = "404 NOT FOUND";
const OK_BODY: &str = "200 OK";

/// Handle `POST /`.
///
/// Always answers `200` with a JSON array; payload problems degrade to `[]`.
pub async fn submit_commands(State(state): State<AppState>, body: Bytes) -> Json<Vec<Value>> {
    let outcome = state.command_bridge.submit(&body).await;
    Json(outcome.responses)
}

/// Handle `GET /` and any other `GET` not claimed by a route.
pub async fn static_asset(State(state): State<AppState>, uri: Uri) -> Response {
    match state.assets.resolve(uri.path()).await {
        Ok(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response(),
        Err(AssetError::NotFound(path)) => {
            tracing::debug!(%path, "Static asset not found");
            not_found()
        }
        Err(AssetError::Io(e)) => {
            tracing::warn!(path = %uri.path(), "Static asset unreadable: {}", e);
            not_found()
        }
    }
}

/// Router fallback.
///
/// `GET`/`HEAD` serve static files and `POST` on any path submits commands.
/// Anything else is logged and answered with a plain `200 OK`.
pub async fn fallback(method: Method, state: State<AppState>, uri: Uri, body: Bytes) -> Response {
    if method == Method::GET || method == Method::HEAD {
        static_asset(state, uri).await
    } else if method == Method::POST {
        submit_commands(state, body).await.into_response()
    } else {
        unexpected_request(method, uri).await
    }
}

/// Answer for methods the bridge has no handler for.
pub async fn unexpected_request(method: Method, uri: Uri) -> Response {
    tracing::warn!(%method, path = %uri.path(), "Unexpected request");
    ([(header::CONTENT_TYPE, "text/plain")], OK_BODY).into_response()
}

/// Handle `GET /health`.
///
/// `503` once the bridge loop has stopped, since nothing restarts it.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let status = *state.status.borrow();
    let body = HealthResponse::new(
        status,
        state.registry.live_count(),
        state.stats.snapshot(),
    );
    let code = if matches!(status, BridgeStatus::Stopped(_)) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(body))
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        NOT_FOUND_BODY,
    )
        .into_response()
}
