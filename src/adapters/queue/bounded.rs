//! In-process bounded FIFO queue.
//!
//! Mirrors the control plane's message queues: a fixed capacity, a
//! non-blocking head removal, and an explicit close that acts as the
//! end-of-stream sentinel once the queue is drained.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::domain::{Command, Envelope};
use crate::ports::{CommandSink, EnqueueError, MessageSource, SourceClosed};

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Thread-safe bounded FIFO.
///
/// The lock is only held for the push/pop itself, never across an await.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
        }
    }

    /// Append an item, failing if the queue is full or closed.
    pub fn try_push(&self, item: T) -> Result<(), EnqueueError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(EnqueueError::Closed);
        }
        if state.items.len() >= self.capacity {
            return Err(EnqueueError::Full);
        }
        state.items.push_back(item);
        Ok(())
    }

    /// Append an item, evicting the oldest entry when the queue is full.
    ///
    /// Returns the evicted item, if any.
    pub fn push_evict_oldest(&self, item: T) -> Result<Option<T>, EnqueueError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(EnqueueError::Closed);
        }
        let evicted = if state.items.len() >= self.capacity {
            state.items.pop_front()
        } else {
            None
        };
        state.items.push_back(item);
        Ok(evicted)
    }

    /// Remove the head without waiting.
    ///
    /// `Err(SourceClosed)` only once the queue is closed *and* empty, so
    /// items queued before closure are still delivered.
    pub fn try_pop(&self) -> Result<Option<T>, SourceClosed> {
        let mut state = self.state.lock();
        match state.items.pop_front() {
            Some(item) => Ok(Some(item)),
            None if state.closed => Err(SourceClosed),
            None => Ok(None),
        }
    }

    /// Mark the queue closed. Further pushes fail; pops drain what remains.
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.state.lock().items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl MessageSource for BoundedQueue<Envelope> {
    fn try_dequeue(&self) -> Result<Option<Envelope>, SourceClosed> {
        self.try_pop()
    }
}

impl CommandSink for BoundedQueue<Command> {
    fn try_enqueue(&self, command: Command) -> Result<(), EnqueueError> {
        self.try_push(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn pops_in_fifo_order() {
        let queue = BoundedQueue::new(4);
        queue.try_push(1).unwrap();
        queue.try_push(2).unwrap();
        queue.try_push(3).unwrap();

        assert_eq!(queue.try_pop(), Ok(Some(1)));
        assert_eq!(queue.try_pop(), Ok(Some(2)));
        assert_eq!(queue.try_pop(), Ok(Some(3)));
        assert_eq!(queue.try_pop(), Ok(None));
    }

    #[test]
    fn push_fails_when_full() {
        let queue = BoundedQueue::new(1);
        queue.try_push("a").unwrap();
        assert_eq!(queue.try_push("b"), Err(EnqueueError::Full));
        assert!(queue.is_full());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let queue = BoundedQueue::<u8>::new(0);
        assert_eq!(queue.capacity(), 1);
        assert!(queue.try_push(1).is_ok());
    }

    #[test]
    fn evict_oldest_keeps_newest_items() {
        let queue = BoundedQueue::new(2);
        assert_eq!(queue.push_evict_oldest(1), Ok(None));
        assert_eq!(queue.push_evict_oldest(2), Ok(None));
        assert_eq!(queue.push_evict_oldest(3), Ok(Some(1)));

        assert_eq!(queue.try_pop(), Ok(Some(2)));
        assert_eq!(queue.try_pop(), Ok(Some(3)));
    }

    #[test]
    fn closed_queue_drains_before_signalling_closure() {
        let queue = BoundedQueue::new(4);
        queue.try_push(1).unwrap();
        queue.close();

        assert_eq!(queue.try_push(2), Err(EnqueueError::Closed));
        assert_eq!(queue.push_evict_oldest(2), Err(EnqueueError::Closed));
        assert_eq!(queue.try_pop(), Ok(Some(1)));
        assert_eq!(queue.try_pop(), Err(SourceClosed));
        assert!(queue.is_closed());
    }

    #[test]
    fn implements_both_queue_ports() {
        let inbound: Arc<dyn MessageSource> = Arc::new(BoundedQueue::<Envelope>::new(2));
        assert_eq!(inbound.try_dequeue(), Ok(None));

        let outbound = BoundedQueue::<Command>::new(1);
        let sink: &dyn CommandSink = &outbound;
        assert!(sink.try_enqueue(Command::new("a", 0.0, 0.0)).is_ok());
        assert_eq!(
            sink.try_enqueue(Command::new("b", 0.0, 0.0)),
            Err(EnqueueError::Full)
        );
    }

    #[test]
    fn concurrent_producers_never_exceed_capacity() {
        let queue = Arc::new(BoundedQueue::new(50));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    (0..100).filter(|i| queue.try_push(t * 1000 + i).is_ok()).count()
                })
            })
            .collect();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(accepted, 50);
        assert_eq!(queue.len(), 50);
    }
}
