//! Server-sent events adapter.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                QueueWatcher                   │
//! │   classifies envelopes into BroadcastEvents   │
//! └──────────────────────────────────────────────┘
//!                       │ publish
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │             SubscriberRegistry                │
//! │   one bounded sink per live connection        │
//! └──────────────────────────────────────────────┘
//!                       │ per-sink recv
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │          GET /events (sse_handler)            │
//! │   data frames + keep-alive comments           │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`registry`] - Subscriber membership and fan-out
//! - [`messages`] - Frame payload types
//! - [`stream`] - Axum SSE handler

pub mod messages;
pub mod registry;
pub mod stream;

pub use messages::{ConnectedMessage, ServerMessage, UpdateMessage, KEEPALIVE_TEXT};
pub use registry::{Delivery, PublishReport, Subscriber, SubscriberId, SubscriberRegistry};
pub use stream::{sse_handler, sse_router, subscriber_stream, SseState};
