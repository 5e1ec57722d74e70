//! Domain layer - message, event and command types.
//!
//! Nothing in here performs I/O. Classification of control-plane messages
//! lives in [`event::classify`].

pub mod command;
pub mod envelope;
pub mod event;
pub mod timestamp;

pub use command::{Command, CommandBatch, CommandBatchError};
pub use envelope::{Envelope, MessageKind, COMMAND_CODE, JSON_STRING_CODE};
pub use event::{
    classify, BroadcastEvent, Classification, ConnectionEvent, EventType, SkipReason,
    DISCRIMINATOR_FIELD,
};
pub use timestamp::Timestamp;
