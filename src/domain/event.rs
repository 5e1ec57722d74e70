//! Broadcast events and the classification of envelopes into them.
//!
//! # Event Type Mapping
//!
//! ```text
//! json_type        event_type
//! ───────────────  ────────────────
//! rx_update      → frequency_update
//! call_log       → call_log
//! channel_update → channel_status
//! plot           → plot_update
//! trunk_update   → trunk_update
//! (anything else)  dropped
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::envelope::{Envelope, MessageKind};
use super::timestamp::Timestamp;

/// Name of the discriminator field inside JSON payloads.
pub const DISCRIMINATOR_FIELD: &str = "json_type";

/// Closed set of event types delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    FrequencyUpdate,
    CallLog,
    ChannelStatus,
    PlotUpdate,
    TrunkUpdate,
}

impl EventType {
    /// Every event type, in mapping-table order.
    pub const ALL: [EventType; 5] = [
        Self::FrequencyUpdate,
        Self::CallLog,
        Self::ChannelStatus,
        Self::PlotUpdate,
        Self::TrunkUpdate,
    ];

    /// Looks up the event type for a `json_type` discriminator value.
    ///
    /// Returns `None` for values outside the mapping table.
    pub fn from_json_type(json_type: &str) -> Option<Self> {
        let event_type = match json_type {
            "rx_update" => Self::FrequencyUpdate,
            "call_log" => Self::CallLog,
            "channel_update" => Self::ChannelStatus,
            "plot" => Self::PlotUpdate,
            "trunk_update" => Self::TrunkUpdate,
            _ => return None,
        };
        Some(event_type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrequencyUpdate => "frequency_update",
            Self::CallLog => "call_log",
            Self::ChannelStatus => "channel_status",
            Self::PlotUpdate => "plot_update",
            Self::TrunkUpdate => "trunk_update",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, broadcast-ready event.
///
/// Shared between subscribers behind an `Arc`; never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastEvent {
    pub event_type: EventType,
    pub data: Map<String, Value>,
    /// Capture time at classification.
    pub timestamp: Timestamp,
}

/// Greeting delivered to a single subscriber right after it registers.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionEvent {
    pub timestamp: Timestamp,
}

impl ConnectionEvent {
    pub const MESSAGE: &'static str = "SSE connection established";

    pub fn now() -> Self {
        Self {
            timestamp: Timestamp::now(),
        }
    }
}

/// Why an envelope produced no event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Envelope kind is not the JSON-string kind.
    NotJson(MessageKind),
    /// Payload is not valid UTF-8 JSON.
    InvalidJson,
    /// Payload is JSON but not an object.
    NotAnObject,
    /// Object has no string `json_type` field.
    MissingDiscriminator,
    /// `json_type` is not in the mapping table.
    UnmappedType(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson(kind) => write!(f, "not a json message ({})", kind),
            Self::InvalidJson => f.write_str("invalid json payload"),
            Self::NotAnObject => f.write_str("json payload is not an object"),
            Self::MissingDiscriminator => write!(f, "missing {}", DISCRIMINATOR_FIELD),
            Self::UnmappedType(json_type) => write!(f, "unmapped json_type {:?}", json_type),
        }
    }
}

/// Outcome of classifying one envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Event(BroadcastEvent),
    Skipped(SkipReason),
}

impl Classification {
    pub fn into_event(self) -> Option<BroadcastEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::Skipped(_) => None,
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }
}

/// Classifies an envelope into a broadcast event.
///
/// Never fails: every malformed or irrelevant envelope yields
/// [`Classification::Skipped`] with the reason.
pub fn classify(envelope: &Envelope) -> Classification {
    if !envelope.kind().is_json() {
        return Classification::Skipped(SkipReason::NotJson(envelope.kind()));
    }

    let value: Value = match serde_json::from_slice(envelope.payload()) {
        Ok(value) => value,
        Err(_) => return Classification::Skipped(SkipReason::InvalidJson),
    };

    let Value::Object(data) = value else {
        return Classification::Skipped(SkipReason::NotAnObject);
    };

    let Some(json_type) = data.get(DISCRIMINATOR_FIELD).and_then(Value::as_str) else {
        return Classification::Skipped(SkipReason::MissingDiscriminator);
    };

    let Some(event_type) = EventType::from_json_type(json_type) else {
        return Classification::Skipped(SkipReason::UnmappedType(json_type.to_string()));
    };

    Classification::Event(BroadcastEvent {
        event_type,
        data,
        timestamp: Timestamp::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const MAPPED: [(&str, EventType); 5] = [
        ("rx_update", EventType::FrequencyUpdate),
        ("call_log", EventType::CallLog),
        ("channel_update", EventType::ChannelStatus),
        ("plot", EventType::PlotUpdate),
        ("trunk_update", EventType::TrunkUpdate),
    ];

    #[test]
    fn mapping_table_is_reproduced_exactly() {
        for (json_type, expected) in MAPPED {
            let envelope = Envelope::from_value(&json!({ "json_type": json_type }));
            let event = classify(&envelope).into_event().expect("mapped type");
            assert_eq!(event.event_type, expected);
        }
    }

    #[test]
    fn event_type_names_match_wire_names() {
        let names: Vec<&str> = EventType::ALL.iter().map(EventType::as_str).collect();
        assert_eq!(
            names,
            ["frequency_update", "call_log", "channel_status", "plot_update", "trunk_update"]
        );
        assert_eq!(
            serde_json::to_string(&EventType::ChannelStatus).unwrap(),
            r#""channel_status""#
        );
    }

    #[test]
    fn event_keeps_original_payload() {
        let payload = json!({ "json_type": "rx_update", "files": ["a.png"], "error": 0 });
        let event = classify(&Envelope::from_value(&payload)).into_event().unwrap();
        assert_eq!(Value::Object(event.data), payload);
    }

    #[test]
    fn unmapped_type_is_skipped_with_reason() {
        let envelope = Envelope::from_value(&json!({ "json_type": "unmapped_type" }));
        assert_eq!(
            classify(&envelope),
            Classification::Skipped(SkipReason::UnmappedType("unmapped_type".into()))
        );
    }

    #[test]
    fn mapping_is_case_sensitive() {
        let envelope = Envelope::from_value(&json!({ "json_type": "RX_UPDATE" }));
        assert!(!classify(&envelope).is_event());
    }

    #[test]
    fn non_json_kind_is_skipped() {
        let envelope = Envelope::new(MessageKind::Other(3), r#"{"json_type":"plot"}"#);
        assert_eq!(
            classify(&envelope),
            Classification::Skipped(SkipReason::NotJson(MessageKind::Other(3)))
        );
    }

    #[test]
    fn malformed_payloads_are_skipped() {
        let cases = [
            (Envelope::json("not json"), SkipReason::InvalidJson),
            (Envelope::new(MessageKind::JsonString, vec![0xff]), SkipReason::InvalidJson),
            (Envelope::json("[1,2]"), SkipReason::NotAnObject),
            (Envelope::json(r#"{"x":1}"#), SkipReason::MissingDiscriminator),
            (Envelope::json(r#"{"json_type":5}"#), SkipReason::MissingDiscriminator),
        ];
        for (envelope, reason) in cases {
            assert_eq!(classify(&envelope), Classification::Skipped(reason));
        }
    }

    proptest! {
        #[test]
        fn only_mapped_types_produce_events(json_type in "[a-z_]{0,16}") {
            let envelope = Envelope::from_value(&json!({ "json_type": json_type }));
            let result = classify(&envelope).into_event();
            match EventType::from_json_type(&json_type) {
                Some(expected) => prop_assert_eq!(result.map(|e| e.event_type), Some(expected)),
                None => prop_assert!(result.is_none()),
            }
        }

        #[test]
        fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = classify(&Envelope::new(MessageKind::JsonString, bytes));
        }
    }
}
