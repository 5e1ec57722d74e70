//! MessageSource port - non-blocking access to a bounded message queue.
//!
//! Replaces the "does this queue expose X or Y" branching with a single
//! abstraction. Each concrete producer gets its own implementation; callers
//! only see this trait.

use thiserror::Error;

use crate::domain::Envelope;

/// Sentinel returned once a source is closed and fully drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("message source closed")]
pub struct SourceClosed;

/// Port for polling a bounded message queue.
///
/// Implementations must not block: an empty queue yields `Ok(None)` and the
/// caller decides how long to back off.
pub trait MessageSource: Send + Sync {
    /// Removes and returns the head of the queue, if any.
    ///
    /// Returns `Err(SourceClosed)` once the producer has closed the queue
    /// and every remaining message has been taken.
    fn try_dequeue(&self) -> Result<Option<Envelope>, SourceClosed>;

    /// Takes every message currently available without waiting.
    ///
    /// Stops at the first empty poll or at closure.
    fn drain(&self) -> Vec<Envelope> {
        let mut drained = Vec::new();
        while let Ok(Some(envelope)) = self.try_dequeue() {
            drained.push(envelope);
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Envelope;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct ScriptedSource(Mutex<VecDeque<Result<Option<Envelope>, SourceClosed>>>);

    impl MessageSource for ScriptedSource {
        fn try_dequeue(&self) -> Result<Option<Envelope>, SourceClosed> {
            self.0.lock().pop_front().unwrap_or(Ok(None))
        }
    }

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn MessageSource) {}

    #[test]
    fn drain_stops_at_first_empty_poll() {
        let source = ScriptedSource(Mutex::new(VecDeque::from(vec![
            Ok(Some(Envelope::json("1"))),
            Ok(Some(Envelope::json("2"))),
            Ok(None),
            Ok(Some(Envelope::json("3"))),
        ])));

        let drained = source.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(source.drain().len(), 1);
    }

    #[test]
    fn drain_stops_at_closure() {
        let source = ScriptedSource(Mutex::new(VecDeque::from(vec![
            Ok(Some(Envelope::json("1"))),
            Err(SourceClosed),
        ])));

        assert_eq!(source.drain().len(), 1);
    }
}
