//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Utc};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Seconds since the Unix epoch with sub-second precision.
    ///
    /// This is the representation browser clients expect in event frames.
    pub fn as_unix_secs_f64(&self) -> f64 {
        self.0.timestamp() as f64 + f64::from(self.0.timestamp_subsec_micros()) / 1_000_000.0
    }
}
