//! CommandSink port - outbound command queue towards the control plane.

use thiserror::Error;

use crate::domain::Command;

/// Why a command could not be enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnqueueError {
    #[error("queue is full")]
    Full,

    #[error("queue is closed")]
    Closed,
}

/// Port for handing commands to the external consumer.
///
/// `try_enqueue` must never block; a full queue is reported, not waited on.
pub trait CommandSink: Send + Sync {
    fn try_enqueue(&self, command: Command) -> Result<(), EnqueueError>;
}
