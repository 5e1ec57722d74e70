//! Ports - Interfaces for external collaborators.
//!
//! The bridge talks to the receiver control plane only through these
//! traits. Adapters implement them.
//!
//! - `MessageSource` - bounded inbound/response queues (non-blocking poll)
//! - `CommandSink` - bounded outbound command queue (drop-on-full)
//! - `AssetResolver` - static file collaborator sharing the listener

mod asset_resolver;
mod command_sink;
mod message_source;

pub use asset_resolver::{Asset, AssetError, AssetResolver};
pub use command_sink::{CommandSink, EnqueueError};
pub use message_source::{MessageSource, SourceClosed};
