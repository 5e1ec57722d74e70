//! Route configuration for the bridge.
//!
//! Routes:
//! - `GET /events` - SSE stream of receiver updates
//! - `POST /` (or any path) - submit commands, receive drained responses
//! - `GET /health` - bridge loop status
//! - `GET /` and `GET /<file>` - static terminal assets
//! - any other method - logged, plain `200 OK`

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::adapters::sse::sse_router;

use super::handlers::{fallback, health, static_asset, submit_commands, unexpected_request};
use super::state::AppState;

/// Creates the full bridge router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(static_asset)
                .post(submit_commands)
                .fallback(unexpected_request),
        )
        .route("/health", get(health))
        .merge(sse_router::<AppState>())
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
