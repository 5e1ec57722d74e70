//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the bridge to external systems:
//! - `queue` - bounded in-process control-plane queues
//! - `sse` - subscriber registry and the `/events` stream
//! - `http` - the listener shared by SSE, commands and static files
//! - `assets` - static terminal files on disk
//! - `stdio` - stdin/stdout plumbing for the standalone binary

pub mod assets;
pub mod http;
pub mod queue;
pub mod sse;
pub mod stdio;

pub use assets::FilesystemAssets;
pub use http::{app_router, AppState};
pub use queue::BoundedQueue;
pub use sse::{SubscriberRegistry, SseState};
