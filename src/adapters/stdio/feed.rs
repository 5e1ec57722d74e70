//! Line-delimited JSON feed into the inbound queue.
//!
//! Each line is `{"type": <i64>, "payload": <string or object>}`. A string
//! payload is taken verbatim; an object is re-serialized. End of input closes
//! the queue, which the bridge loop reads as "producer closed".

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use crate::adapters::queue::BoundedQueue;
use crate::domain::{Envelope, MessageKind};
use crate::ports::EnqueueError;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Malformed feed line: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct FeedLine {
    #[serde(rename = "type")]
    kind: MessageKind,
    payload: Payload,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Text(String),
    Structured(Value),
}

/// Parse one feed line into an envelope.
pub fn parse_line(line: &str) -> Result<Envelope, FeedError> {
    let FeedLine { kind, payload } = serde_json::from_str(line)?;
    let bytes = match payload {
        Payload::Text(text) => text.into_bytes(),
        Payload::Structured(value) => serde_json::to_vec(&value)?,
    };
    Ok(Envelope::new(kind, bytes))
}

/// Counters for one feed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub enqueued: u64,
    pub rejected: u64,
}

/// Pump lines from `reader` into `queue` until end of input or shutdown.
///
/// A full queue is retried every `retry` rather than dropping the line. The
/// queue is closed on return.
pub async fn pump_lines<R>(
    reader: R,
    queue: Arc<BoundedQueue<Envelope>>,
    retry: Duration,
    shutdown: CancellationToken,
) -> std::io::Result<FeedSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut summary = FeedSummary::default();

    let result = loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break Ok(()),
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        if line.trim().is_empty() {
            continue;
        }

        let envelope = match parse_line(&line) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Skipping feed line: {}", e);
                summary.rejected += 1;
                continue;
            }
        };

        if enqueue_with_retry(&queue, envelope, retry, &shutdown).await {
            summary.enqueued += 1;
        } else {
            break Ok(());
        }
    };

    queue.close();
    tracing::info!(
        enqueued = summary.enqueued,
        rejected = summary.rejected,
        "Inbound feed ended"
    );
    result.map(|()| summary)
}

/// Returns `false` when the envelope could not be delivered at all.
async fn enqueue_with_retry(
    queue: &BoundedQueue<Envelope>,
    envelope: Envelope,
    retry: Duration,
    shutdown: &CancellationToken,
) -> bool {
    loop {
        match queue.try_push(envelope.clone()) {
            Ok(()) => return true,
            Err(EnqueueError::Closed) => return false,
            Err(EnqueueError::Full) => {
                tracing::trace!("Inbound queue full, retrying");
            }
        }
        tokio::select! {
            _ = shutdown.cancelled() => return false,
            _ = tokio::time::sleep(retry) => {}
        }
    }
}
