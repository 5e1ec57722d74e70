//! HTTP response bodies.

use serde::Serialize;

use crate::application::{BridgeStatus, StatsSnapshot, StopReason};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub bridge: &'static str,
    pub reason: Option<StopReason>,
    pub subscribers: usize,
    pub stats: StatsSnapshot,
}

impl HealthResponse {
    pub fn new(status: BridgeStatus, subscribers: usize, stats: StatsSnapshot) -> Self {
        let reason = match status {
            BridgeStatus::Stopped(reason) => Some(reason),
            _ => None,
        };
        Self {
            bridge: status.label(),
            reason,
            subscribers,
            stats,
        }
    }
}
