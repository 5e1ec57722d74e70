//! SSE endpoint for real-time receiver updates.
//!
//! Connection lifecycle:
//! 1. Register a subscriber (greeting already queued in its sink)
//! 2. Stream every delivery from the sink as a `data:` frame
//! 3. Fill idle gaps with keep-alive comments
//! 4. Unregister when the stream is dropped, whatever the reason

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRef, State};
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::Stream;

use super::messages::KEEPALIVE_TEXT;
use super::registry::{Subscriber, SubscriberRegistry};

/// State required for SSE handling.
#[derive(Clone)]
pub struct SseState {
    pub registry: Arc<SubscriberRegistry>,
    /// Idle time after which a keep-alive frame is sent.
    pub heartbeat: Duration,
}

impl SseState {
    pub fn new(registry: Arc<SubscriberRegistry>, heartbeat: Duration) -> Self {
        Self {
            registry,
            heartbeat,
        }
    }
}

/// Handle `GET /events`.
pub async fn sse_handler(State(state): State<SseState>) -> impl IntoResponse {
    let subscriber = state.registry.register();
    tracing::info!(
        subscriber_id = %subscriber.id(),
        live = state.registry.live_count(),
        "SSE connection opened"
    );

    let sse = Sse::new(subscriber_stream(subscriber)).keep_alive(
        KeepAlive::new()
            .interval(state.heartbeat)
            .text(KEEPALIVE_TEXT),
    );

    (
        [
            (header::CONNECTION, "keep-alive"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Cache-Control"),
        ],
        sse,
    )
}

/// Turn a subscriber into a stream of SSE frames.
///
/// The subscriber lives inside the stream state; dropping the stream (client
/// gone, write error, shutdown) drops the subscriber, which unregisters it.
pub fn subscriber_stream(subscriber: Subscriber) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(subscriber, |mut subscriber| async move {
        loop {
            let delivery = subscriber.recv().await?;
            match Event::default().json_data(delivery.to_server_message()) {
                Ok(event) => return Some((Ok(event), subscriber)),
                Err(e) => {
                    tracing::warn!(
                        subscriber_id = %subscriber.id(),
                        "Failed to serialize SSE frame, skipping: {}",
                        e
                    );
                }
            }
        }
    })
}

/// Create axum router for the SSE endpoint.
///
/// Generic over the outer state so it can be merged into the application
/// router.
pub fn sse_router<S>() -> axum::Router<S>
where
    SseState: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    use axum::routing::get;

    axum::Router::new().route("/events", get(sse_handler))
}
