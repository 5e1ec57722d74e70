//! Shared HTTP state.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use tokio::sync::watch;

use crate::adapters::sse::{SseState, SubscriberRegistry};
use crate::application::{BridgeStatus, CommandBridge, WatcherStats};
use crate::ports::AssetResolver;

/// Bridge health inputs.
#[derive(Clone)]
pub struct HealthState {
    pub status: watch::Receiver<BridgeStatus>,
    pub registry: Arc<SubscriberRegistry>,
    pub stats: Arc<WatcherStats>,
}

/// Application state shared by every handler.
///
/// Cloned per request; everything inside is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub sse: SseState,
    pub command_bridge: Arc<CommandBridge>,
    pub assets: Arc<dyn AssetResolver>,
    pub health: HealthState,
}

impl AppState {
    pub fn new(
        registry: Arc<SubscriberRegistry>,
        heartbeat: Duration,
        command_bridge: Arc<CommandBridge>,
        assets: Arc<dyn AssetResolver>,
        status: watch::Receiver<BridgeStatus>,
        stats: Arc<WatcherStats>,
    ) -> Self {
        Self {
            sse: SseState::new(Arc::clone(&registry), heartbeat),
            command_bridge,
            assets,
            health: HealthState {
                status,
                registry,
                stats,
            },
        }
    }
}

impl FromRef<AppState> for SseState {
    fn from_ref(state: &AppState) -> Self {
        state.sse.clone()
    }
}

impl FromRef<AppState> for HealthState {
    fn from_ref(state: &AppState) -> Self {
        state.health.clone()
    }
}
