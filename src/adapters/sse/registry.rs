//! Subscriber registry for fan-out of broadcast events.
//!
//! Every live SSE connection owns one [`Subscriber`], backed by a private
//! bounded channel. The registry holds the sending halves.
//!
//! ```text
//! QueueWatcher ── publish(event) ──► SubscriberRegistry
//!                                     ├── sink ─► subscriber-a
//!                                     ├── sink ─► subscriber-b
//!                                     └── sink ─► subscriber-c
//! ```
//!
//! A sink that is full or gone marks only its own subscriber closed; the
//! other subscribers still receive the event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::domain::{BroadcastEvent, ConnectionEvent};

/// Unique identifier for one subscriber connection.
///
/// Generated server-side when a client connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Item carried by a subscriber's sink.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// Greeting, only ever sent to the subscriber that registered.
    Connected(ConnectionEvent),
    /// Shared broadcast event.
    Event(Arc<BroadcastEvent>),
}

/// Result of one publish call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Sending side of one sink.
///
/// The closed check and the send happen under the same lock as closing, so
/// nothing is delivered once the subscriber is marked closed.
#[derive(Debug)]
struct SinkGate {
    sender: Mutex<Option<mpsc::Sender<Delivery>>>,
    closed: AtomicBool,
}

enum SendOutcome {
    Delivered,
    AlreadyClosed,
    Full,
    Gone,
}

impl SinkGate {
    fn open(sender: mpsc::Sender<Delivery>) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
            closed: AtomicBool::new(false),
        }
    }

    fn closed() -> Self {
        Self {
            sender: Mutex::new(None),
            closed: AtomicBool::new(true),
        }
    }

    fn try_deliver(&self, delivery: Delivery) -> SendOutcome {
        let sender = self.sender.lock();
        if self.closed.load(Ordering::Acquire) {
            return SendOutcome::AlreadyClosed;
        }
        match (*sender).as_ref().map(|tx| tx.try_send(delivery)) {
            Some(Ok(())) => SendOutcome::Delivered,
            Some(Err(TrySendError::Full(_))) => SendOutcome::Full,
            Some(Err(TrySendError::Closed(_))) | None => SendOutcome::Gone,
        }
    }

    /// Mark closed and drop the sender; buffered items stay readable.
    fn close(&self) {
        let mut sender = self.sender.lock();
        self.closed.store(true, Ordering::Release);
        sender.take();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Registration handle and receiving end of one subscriber's sink.
///
/// Dropping the handle unregisters the subscriber, so cleanup runs on every
/// exit path of the connection that owns it.
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    receiver: mpsc::Receiver<Delivery>,
    gate: Arc<SinkGate>,
    registry: Weak<SubscriberRegistry>,
}

impl Subscriber {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next delivery.
    ///
    /// Returns `None` once the registry dropped this sink (shutdown, or
    /// the subscriber was evicted) and everything buffered was consumed.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }

    /// Takes the next delivery if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        self.receiver.try_recv().ok()
    }

    /// True once the sink was marked closed by the registry.
    pub fn is_closed(&self) -> bool {
        self.gate.is_closed()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.gate.close();
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(&self.id);
        }
    }
}

/// Thread-safe set of active subscribers.
///
/// # Thread Safety
///
/// Membership lives behind one mutex. `publish` copies the membership out
/// and releases the lock before touching any sink, so a slow or full sink
/// can never hold up registration, removal or another publish.
#[derive(Debug)]
pub struct SubscriberRegistry {
    sinks: Mutex<HashMap<SubscriberId, Arc<SinkGate>>>,
    sink_capacity: usize,
    /// Set by `close_all`; later registrations get an already-closed sink.
    closed: AtomicBool,
}

impl SubscriberRegistry {
    /// Create a registry whose per-subscriber sinks buffer `sink_capacity`
    /// deliveries (minimum 1, the greeting needs a slot).
    pub fn new(sink_capacity: usize) -> Self {
        Self {
            sinks: Mutex::new(HashMap::new()),
            sink_capacity: sink_capacity.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Create with default capacity (64 deliveries).
    pub fn with_default_capacity() -> Self {
        Self::new(64)
    }

    /// Register a new subscriber.
    ///
    /// The connection greeting is already in the returned subscriber's sink;
    /// nobody else sees it. After `close_all` the subscriber is returned
    /// closed: it yields the greeting and then ends.
    pub fn register(self: &Arc<Self>) -> Subscriber {
        let id = SubscriberId::new();
        let (sender, receiver) = mpsc::channel(self.sink_capacity);

        // Fresh channel with at least one slot: cannot fail.
        let _ = sender.try_send(Delivery::Connected(ConnectionEvent::now()));

        let registered = {
            let mut sinks = self.sinks.lock();
            if self.closed.load(Ordering::Acquire) {
                None
            } else {
                let gate = Arc::new(SinkGate::open(sender));
                sinks.insert(id, Arc::clone(&gate));
                Some((gate, sinks.len()))
            }
        };

        let gate = match registered {
            Some((gate, live)) => {
                tracing::debug!(subscriber_id = %id, live, "Subscriber registered");
                gate
            }
            None => {
                tracing::debug!(subscriber_id = %id, "Registry closed, subscriber not registered");
                Arc::new(SinkGate::closed())
            }
        };

        Subscriber {
            id,
            receiver,
            gate,
            registry: Arc::downgrade(self),
        }
    }

    /// Remove a subscriber. Idempotent.
    ///
    /// Returns `true` only for the call that actually removed it.
    pub fn unregister(&self, id: &SubscriberId) -> bool {
        let (removed, live) = {
            let mut sinks = self.sinks.lock();
            let removed = sinks.remove(id);
            (removed, sinks.len())
        };

        match removed {
            Some(gate) => {
                gate.close();
                tracing::debug!(subscriber_id = %id, live, "Subscriber unregistered");
                true
            }
            None => false,
        }
    }

    /// Deliver an event to every registered, non-closed subscriber.
    ///
    /// Subscribers whose sink is full or whose receiver is gone are marked
    /// closed and removed. Subscribers registering concurrently may miss
    /// this event.
    pub fn publish(&self, event: BroadcastEvent) -> PublishReport {
        let event = Arc::new(event);
        let snapshot: Vec<(SubscriberId, Arc<SinkGate>)> = self
            .sinks
            .lock()
            .iter()
            .map(|(id, gate)| (*id, Arc::clone(gate)))
            .collect();

        let mut report = PublishReport::default();
        let mut evicted = Vec::new();

        for (id, gate) in snapshot {
            match gate.try_deliver(Delivery::Event(Arc::clone(&event))) {
                SendOutcome::Delivered => report.delivered += 1,
                SendOutcome::AlreadyClosed => {}
                SendOutcome::Full => {
                    tracing::debug!(subscriber_id = %id, "Subscriber sink full, closing");
                    gate.close();
                    evicted.push(id);
                    report.dropped += 1;
                }
                SendOutcome::Gone => {
                    gate.close();
                    evicted.push(id);
                    report.dropped += 1;
                }
            }
        }

        if !evicted.is_empty() {
            let mut sinks = self.sinks.lock();
            for id in &evicted {
                sinks.remove(id);
            }
        }

        tracing::trace!(
            event_type = %event.event_type,
            delivered = report.delivered,
            dropped = report.dropped,
            "Event published"
        );
        report
    }

    /// Mark every subscriber closed, drop every sink, and refuse further
    /// registrations.
    ///
    /// Pending `recv` calls return `None` once buffered items are consumed.
    pub fn close_all(&self) {
        let drained: Vec<Arc<SinkGate>> = {
            let mut sinks = self.sinks.lock();
            self.closed.store(true, Ordering::Release);
            sinks.drain().map(|(_, gate)| gate).collect()
        };
        for gate in &drained {
            gate.close();
        }
        tracing::debug!(closed = drained.len(), "All subscriber sinks closed");
    }

    /// Whether `close_all` has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of currently registered subscribers.
    pub fn live_count(&self) -> usize {
        self.sinks.lock().len()
    }

    /// Whether a subscriber is currently registered.
    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.sinks.lock().contains_key(id)
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
