//! Raw messages exchanged with the receiver control plane.
//!
//! Every message carries a numeric type code. Only a handful of codes mean
//! something to the bridge; the rest are carried through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type code the control plane uses for JSON string payloads.
pub const JSON_STRING_CODE: i64 = -4;

/// Type code the control plane uses for outbound command messages.
pub const COMMAND_CODE: i64 = -2;

/// Classification of a queue message by its producer-defined type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum MessageKind {
    /// Payload is a JSON document encoded as a string.
    JsonString,
    /// Command message (string plus two numeric arguments).
    Command,
    /// Any other producer-defined code; opaque to the bridge.
    Other(i64),
}

impl MessageKind {
    /// Returns the wire code for this kind.
    pub fn code(&self) -> i64 {
        match self {
            Self::JsonString => JSON_STRING_CODE,
            Self::Command => COMMAND_CODE,
            Self::Other(code) => *code,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::JsonString)
    }
}

impl From<i64> for MessageKind {
    fn from(code: i64) -> Self {
        match code {
            JSON_STRING_CODE => Self::JsonString,
            COMMAND_CODE => Self::Command,
            other => Self::Other(other),
        }
    }
}

impl From<MessageKind> for i64 {
    fn from(kind: MessageKind) -> Self {
        kind.code()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonString => write!(f, "json({})", JSON_STRING_CODE),
            Self::Command => write!(f, "command({})", COMMAND_CODE),
            Self::Other(code) => write!(f, "other({})", code),
        }
    }
}

/// Immutable unit read from a control-plane queue, before classification.
///
/// Fields are private so no consumer can alter an envelope after dequeue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    kind: MessageKind,
    payload: Vec<u8>,
}

impl Envelope {
    pub fn new(kind: MessageKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Creates a JSON-string envelope from already serialized text.
    pub fn json(text: impl Into<String>) -> Self {
        Self::new(MessageKind::JsonString, text.into().into_bytes())
    }

    /// Creates a JSON-string envelope by serializing a value.
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self::json(value.to_string())
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as text, if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
