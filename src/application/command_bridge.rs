//! Command submission and response collection for `POST /`.
//!
//! There is no correlation between submitted commands and the responses
//! that are returned: after a fixed settle delay, whatever is sitting in the
//! response queue is drained and handed back, even if it was produced for
//! an earlier request.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::domain::{CommandBatch, Envelope};
use crate::ports::{CommandSink, EnqueueError, MessageSource};

/// Result of handling one command request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutcome {
    /// Whether the body parsed as a command batch.
    pub accepted: bool,
    /// Commands placed on the outbound queue.
    pub forwarded: usize,
    /// Commands dropped because the outbound queue was full or closed.
    pub dropped: usize,
    /// Decoded JSON responses drained from the response queue.
    pub responses: Vec<Value>,
}

/// Submits command batches and drains the response queue.
pub struct CommandBridge {
    sink: Arc<dyn CommandSink>,
    responses: Arc<dyn MessageSource>,
    settle_delay: Duration,
}

impl CommandBridge {
    pub fn new(
        sink: Arc<dyn CommandSink>,
        responses: Arc<dyn MessageSource>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            sink,
            responses,
            settle_delay,
        }
    }

    /// Handle one request body.
    ///
    /// An unparseable body forwards nothing, skips the settle delay, and
    /// still drains (and discards) the response queue.
    pub async fn submit(&self, body: &[u8]) -> CommandOutcome {
        let batch = match CommandBatch::parse(body) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting command batch");
                let discarded = self.responses.drain().len();
                if discarded > 0 {
                    tracing::debug!(discarded, "Discarded responses for rejected batch");
                }
                return CommandOutcome::default();
            }
        };

        let mut outcome = CommandOutcome {
            accepted: true,
            ..Default::default()
        };

        for command in batch {
            let name = command.command.clone();
            match self.sink.try_enqueue(command) {
                Ok(()) => outcome.forwarded += 1,
                Err(EnqueueError::Full) | Err(EnqueueError::Closed) => {
                    tracing::debug!(command = %name, "Outbound queue unavailable, dropping command");
                    outcome.dropped += 1;
                }
            }
        }

        tokio::time::sleep(self.settle_delay).await;

        outcome.responses = self.collect_responses();
        tracing::debug!(
            forwarded = outcome.forwarded,
            dropped = outcome.dropped,
            responses = outcome.responses.len(),
            "Command batch handled"
        );
        outcome
    }

    /// Drain the response queue, keeping decodable JSON-string entries.
    fn collect_responses(&self) -> Vec<Value> {
        self.responses
            .drain()
            .iter()
            .filter_map(decode_response)
            .collect()
    }
}

fn decode_response(envelope: &Envelope) -> Option<Value> {
    if !envelope.kind().is_json() {
        return None;
    }
    match serde_json::from_slice(envelope.payload()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping undecodable response");
            None
        }
    }
}
