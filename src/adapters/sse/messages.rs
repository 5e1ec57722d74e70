//! Server-sent event payloads.
//!
//! Each frame is `data: <json>\n\n`. Idle periods are filled with the
//! comment frame `: keepalive\n\n`, which SSE parsers ignore.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{ConnectionEvent, EventType};

use super::registry::Delivery;

/// Comment text of the keep-alive frame.
pub const KEEPALIVE_TEXT: &str = "keepalive";

/// Event name used for the connection greeting.
pub const CONNECTION_EVENT: &str = "connection";

/// All payloads that can be sent to a subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerMessage<'a> {
    /// Connection established.
    Connected(ConnectedMessage),

    /// Classified control-plane update.
    Update(UpdateMessage<'a>),
}

/// Sent once, right after a subscriber registers.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedMessage {
    pub event: &'static str,
    pub timestamp: f64,
    pub message: &'static str,
}

impl From<&ConnectionEvent> for ConnectedMessage {
    fn from(event: &ConnectionEvent) -> Self {
        Self {
            event: CONNECTION_EVENT,
            timestamp: event.timestamp.as_unix_secs_f64(),
            message: ConnectionEvent::MESSAGE,
        }
    }
}

/// Broadcast update carrying the original decoded payload.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateMessage<'a> {
    pub event: EventType,
    pub timestamp: f64,
    pub data: &'a Map<String, Value>,
}

impl Delivery {
    /// Convert to a server message for sending to the client.
    pub fn to_server_message(&self) -> ServerMessage<'_> {
        match self {
            Delivery::Connected(greeting) => ServerMessage::Connected(greeting.into()),
            Delivery::Event(event) => ServerMessage::Update(UpdateMessage {
                event: event.event_type,
                timestamp: event.timestamp.as_unix_secs_f64(),
                data: &event.data,
            }),
        }
    }
}
