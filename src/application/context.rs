//! Explicit server context.
//!
//! Owns the registry, the response queue and the one queue watcher. The HTTP
//! layer and the watcher receive what they need from here; nothing is
//! process-global.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::adapters::http::{app_router, AppState};
use crate::adapters::queue::BoundedQueue;
use crate::adapters::sse::SubscriberRegistry;
use crate::config::AppConfig;
use crate::domain::Envelope;
use crate::ports::{AssetResolver, CommandSink, MessageSource};

use super::command_bridge::CommandBridge;
use super::queue_watcher::{BridgeStatus, QueueWatcher, StopReason, WatcherStats};

/// Timing and sizing knobs for one bridge instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    pub poll_interval: Duration,
    pub heartbeat: Duration,
    pub settle_delay: Duration,
    pub sink_capacity: usize,
    pub response_capacity: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            heartbeat: Duration::from_secs(1),
            settle_delay: Duration::from_millis(200),
            sink_capacity: 64,
            response_capacity: 10,
        }
    }
}

impl From<&AppConfig> for BridgeSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.bridge.poll_interval(),
            heartbeat: config.sse.heartbeat(),
            settle_delay: config.commands.settle_delay(),
            sink_capacity: config.sse.sink_capacity,
            response_capacity: config.bridge.response_capacity,
        }
    }
}

/// One bridge instance: registry, response queue, watcher and HTTP state.
pub struct BridgeContext {
    registry: Arc<SubscriberRegistry>,
    responses: Arc<BoundedQueue<Envelope>>,
    command_bridge: Arc<CommandBridge>,
    assets: Arc<dyn AssetResolver>,
    heartbeat: Duration,
    watcher: Option<QueueWatcher>,
    status: watch::Receiver<BridgeStatus>,
    stats: Arc<WatcherStats>,
    shutdown: CancellationToken,
}

impl BridgeContext {
    /// Build a context around the inbound source, outbound command sink and
    /// static asset collaborator.
    pub fn new(
        settings: BridgeSettings,
        inbound: Arc<dyn MessageSource>,
        commands: Arc<dyn CommandSink>,
        assets: Arc<dyn AssetResolver>,
    ) -> Self {
        let registry = Arc::new(SubscriberRegistry::new(settings.sink_capacity));
        let responses = Arc::new(BoundedQueue::new(settings.response_capacity));

        let watcher = QueueWatcher::new(inbound, Arc::clone(&registry), settings.poll_interval)
            .with_response_mirror(Arc::clone(&responses));
        let status = watcher.status();
        let stats = watcher.stats();

        let command_bridge = Arc::new(CommandBridge::new(
            commands,
            responses.clone(),
            settings.settle_delay,
        ));

        Self {
            registry,
            responses,
            command_bridge,
            assets,
            heartbeat: settings.heartbeat,
            watcher: Some(watcher),
            status,
            stats,
            shutdown: CancellationToken::new(),
        }
    }

    /// Spawn the queue watcher.
    ///
    /// Returns `None` if it was already spawned; there is exactly one
    /// watcher per context.
    pub fn spawn_watcher(&mut self) -> Option<JoinHandle<StopReason>> {
        let watcher = self.watcher.take()?;
        let shutdown = self.shutdown.clone();
        Some(tokio::spawn(watcher.run(shutdown)))
    }

    /// HTTP state shared by all handlers.
    pub fn app_state(&self) -> AppState {
        AppState::new(
            Arc::clone(&self.registry),
            self.heartbeat,
            Arc::clone(&self.command_bridge),
            Arc::clone(&self.assets),
            self.status.clone(),
            Arc::clone(&self.stats),
        )
    }

    /// Full HTTP router for this bridge.
    pub fn router(&self) -> Router {
        app_router(self.app_state())
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    pub fn responses(&self) -> &Arc<BoundedQueue<Envelope>> {
        &self.responses
    }

    pub fn status(&self) -> BridgeStatus {
        *self.status.borrow()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the watcher and close every subscriber sink.
    pub fn shutdown(&self) {
        tracing::info!(live = self.registry.live_count(), "Shutting down bridge");
        self.shutdown.cancel();
        self.registry.close_all();
    }
}
