//! Bridge loop between the inbound control-plane queue and subscribers.
//!
//! # Loop
//!
//! ```text
//! try_dequeue ─┬─ Some(envelope) ─► mirror to response queue
//!              │                    classify ─► registry.publish
//!              ├─ None ───────────► sleep(poll_interval)
//!              └─ SourceClosed ───► stop (ProducerClosed)
//! ```
//!
//! The source offers no blocking wait, so an empty queue is polled again
//! after a short fixed sleep.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::adapters::queue::BoundedQueue;
use crate::adapters::sse::{PublishReport, SubscriberRegistry};
use crate::domain::{classify, Classification, Envelope, EventType, SkipReason};
use crate::ports::{MessageSource, SourceClosed};

/// Why the bridge loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The inbound source reported closure.
    ProducerClosed,
    /// Shutdown was requested.
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProducerClosed => f.write_str("producer_closed"),
            Self::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// Externally observable state of the bridge loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    Starting,
    Running,
    Stopped(StopReason),
}

impl BridgeStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopped(_) => "stopped",
        }
    }
}

/// Counters maintained by the loop.
#[derive(Debug, Default)]
pub struct WatcherStats {
    dequeued: AtomicU64,
    published: AtomicU64,
    skipped: AtomicU64,
    panicked: AtomicU64,
}

/// Point-in-time copy of [`WatcherStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub dequeued: u64,
    pub published: u64,
    pub skipped: u64,
    pub panicked: u64,
}

impl WatcherStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dequeued: self.dequeued.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// What happened to one processed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    Published {
        event_type: EventType,
        report: PublishReport,
    },
    Skipped(SkipReason),
}

impl Processed {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// The single long-lived loop that drains the inbound source.
pub struct QueueWatcher {
    source: Arc<dyn MessageSource>,
    registry: Arc<SubscriberRegistry>,
    responses: Option<Arc<BoundedQueue<Envelope>>>,
    poll_interval: Duration,
    status: watch::Sender<BridgeStatus>,
    stats: Arc<WatcherStats>,
}

impl QueueWatcher {
    pub fn new(
        source: Arc<dyn MessageSource>,
        registry: Arc<SubscriberRegistry>,
        poll_interval: Duration,
    ) -> Self {
        let (status, _) = watch::channel(BridgeStatus::Starting);
        Self {
            source,
            registry,
            responses: None,
            poll_interval,
            status,
            stats: Arc::new(WatcherStats::default()),
        }
    }

    /// Also copy every dequeued envelope into `responses`, evicting the
    /// oldest entry when it is full.
    pub fn with_response_mirror(mut self, responses: Arc<BoundedQueue<Envelope>>) -> Self {
        self.responses = Some(responses);
        self
    }

    /// Subscribe to status changes.
    pub fn status(&self) -> watch::Receiver<BridgeStatus> {
        self.status.subscribe()
    }

    pub fn stats(&self) -> Arc<WatcherStats> {
        Arc::clone(&self.stats)
    }

    /// Handle one envelope: mirror it, classify it, publish any event.
    pub fn process(&self, envelope: Envelope) -> Processed {
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);

        let classification = classify(&envelope);

        if let Some(responses) = &self.responses {
            if let Ok(Some(evicted)) = responses.push_evict_oldest(envelope) {
                tracing::trace!(kind = %evicted.kind(), "Response queue full, evicted oldest");
            }
        }

        match classification {
            Classification::Event(event) => {
                self.stats.published.fetch_add(1, Ordering::Relaxed);
                let event_type = event.event_type;
                let report = self.registry.publish(event);
                Processed::Published { event_type, report }
            }
            Classification::Skipped(reason) => {
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(%reason, "Envelope not broadcast");
                Processed::Skipped(reason)
            }
        }
    }

    /// Run until shutdown is requested or the source closes.
    pub async fn run(self, shutdown: CancellationToken) -> StopReason {
        self.status.send_replace(BridgeStatus::Running);
        tracing::info!(
            poll_interval = ?self.poll_interval,
            "Queue watcher started"
        );

        let reason = loop {
            if shutdown.is_cancelled() {
                break StopReason::Shutdown;
            }

            match self.source.try_dequeue() {
                Ok(Some(envelope)) => {
                    self.dispatch(envelope);
                    tokio::task::yield_now().await;
                }
                Ok(None) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break StopReason::Shutdown,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
                Err(SourceClosed) => {
                    tracing::warn!("Inbound source closed, broadcasting stops");
                    break StopReason::ProducerClosed;
                }
            }
        };

        self.status.send_replace(BridgeStatus::Stopped(reason));
        tracing::info!(%reason, stats = ?self.stats.snapshot(), "Queue watcher stopped");
        reason
    }

    /// Process one envelope without letting a panic end the loop.
    fn dispatch(&self, envelope: Envelope) {
        let kind = envelope.kind();
        if catch_unwind(AssertUnwindSafe(|| self.process(envelope))).is_err() {
            self.stats.panicked.fetch_add(1, Ordering::Relaxed);
            tracing::error!(%kind, "Panic while processing envelope, continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sse::Delivery;
    use serde_json::json;

    fn watcher(source: Arc<BoundedQueue<Envelope>>) -> (QueueWatcher, Arc<SubscriberRegistry>) {
        let registry = Arc::new(SubscriberRegistry::default());
        let watcher = QueueWatcher::new(source, registry.clone(), Duration::from_millis(10));
        (watcher, registry)
    }

    fn rx_update() -> Envelope {
        Envelope::from_value(&json!({ "json_type": "rx_update", "error": 0 }))
    }

    #[test]
    fn process_publishes_mapped_events() {
        let (watcher, registry) = watcher(Arc::new(BoundedQueue::new(4)));
        let mut subscriber = registry.register();
        assert!(matches!(subscriber.try_recv(), Some(Delivery::Connected(_))));

        let outcome = watcher.process(rx_update());
        assert_eq!(
            outcome,
            Processed::Published {
                event_type: EventType::FrequencyUpdate,
                report: PublishReport { delivered: 1, dropped: 0 },
            }
        );

        match subscriber.try_recv() {
            Some(Delivery::Event(event)) => {
                assert_eq!(event.event_type, EventType::FrequencyUpdate)
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn process_skips_unmapped_types_without_delivery() {
        let (watcher, registry) = watcher(Arc::new(BoundedQueue::new(4)));
        let mut subscriber = registry.register();
        subscriber.try_recv();

        let outcome = watcher.process(Envelope::from_value(&json!({ "json_type": "unmapped_type" })));
        assert_eq!(
            outcome,
            Processed::Skipped(SkipReason::UnmappedType("unmapped_type".into()))
        );
        assert!(!outcome.is_published());
        assert!(subscriber.try_recv().is_none());
        assert_eq!(watcher.stats().snapshot().skipped, 1);
    }

    #[test]
    fn process_mirrors_every_envelope_with_eviction() {
        let responses = Arc::new(BoundedQueue::new(2));
        let (watcher, _registry) = watcher(Arc::new(BoundedQueue::new(4)));
        let watcher = watcher.with_response_mirror(responses.clone());

        watcher.process(Envelope::json("1"));
        watcher.process(Envelope::json("2"));
        watcher.process(Envelope::json("3"));

        assert_eq!(responses.len(), 2);
        assert_eq!(responses.try_pop().unwrap().unwrap().payload_str(), Some("2"));
        assert_eq!(responses.try_pop().unwrap().unwrap().payload_str(), Some("3"));
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_when_producer_closes() {
        let source = Arc::new(BoundedQueue::new(4));
        source.try_push(rx_update()).unwrap();
        source.close();

        let (watcher, _registry) = watcher(source);
        let mut status = watcher.status();
        let stats = watcher.stats();

        let reason = watcher.run(CancellationToken::new()).await;

        assert_eq!(reason, StopReason::ProducerClosed);
        assert_eq!(stats.snapshot().published, 1);
        assert_eq!(
            *status.borrow_and_update(),
            BridgeStatus::Stopped(StopReason::ProducerClosed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_on_shutdown_while_idle() {
        let (watcher, _registry) = watcher(Arc::new(BoundedQueue::new(4)));
        let status = watcher.status();
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(watcher.run(shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*status.borrow(), BridgeStatus::Running);

        shutdown.cancel();
        assert_eq!(handle.await.unwrap(), StopReason::Shutdown);
        assert_eq!(*status.borrow(), BridgeStatus::Stopped(StopReason::Shutdown));
    }

    #[tokio::test(start_paused = true)]
    async fn run_accepts_unbounded_poll_interval() {
        let registry = Arc::new(SubscriberRegistry::default());
        let watcher = QueueWatcher::new(
            Arc::new(BoundedQueue::<Envelope>::new(4)),
            registry,
            Duration::MAX,
        );
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(watcher.run(shutdown.clone()));
        tokio::task::yield_now().await;
        shutdown.cancel();

        assert_eq!(handle.await.unwrap(), StopReason::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn run_picks_up_messages_after_idle_period() {
        let source = Arc::new(BoundedQueue::new(4));
        let (watcher, registry) = watcher(source.clone());
        let mut subscriber = registry.register();
        subscriber.try_recv();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(watcher.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        source.try_push(rx_update()).unwrap();

        let delivery = tokio::time::timeout(Duration::from_secs(1), subscriber.recv())
            .await
            .expect("event within timeout");
        assert!(matches!(delivery, Some(Delivery::Event(_))));

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_messages_do_not_stop_the_loop() {
        let source = Arc::new(BoundedQueue::new(8));
        source.try_push(Envelope::json("{broken")).unwrap();
        source.try_push(Envelope::json("[]")).unwrap();
        source.try_push(rx_update()).unwrap();
        source.close();

        let (watcher, _registry) = watcher(source);
        let stats = watcher.stats();
        watcher.run(CancellationToken::new()).await;

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.dequeued, 3);
        assert_eq!(snapshot.skipped, 2);
        assert_eq!(snapshot.published, 1);
        assert_eq!(snapshot.panicked, 0);
    }

    #[test]
    fn status_labels() {
        assert_eq!(BridgeStatus::Starting.label(), "starting");
        assert_eq!(BridgeStatus::Running.label(), "running");
        assert_eq!(BridgeStatus::Stopped(StopReason::Shutdown).label(), "stopped");
        assert!(BridgeStatus::Running.is_running());
    }
}
