//! Application layer - the bridge loop, the command bridge and the server
//! context that wires them together.

pub mod command_bridge;
pub mod context;
pub mod queue_watcher;

pub use command_bridge::{CommandBridge, CommandOutcome};
pub use context::{BridgeContext, BridgeSettings};
pub use queue_watcher::{
    BridgeStatus, Processed, QueueWatcher, StatsSnapshot, StopReason, WatcherStats,
};
