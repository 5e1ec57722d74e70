//! Shared fixtures for bridge integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;

use op25_bridge::adapters::{BoundedQueue, FilesystemAssets};
use op25_bridge::application::{BridgeContext, BridgeSettings};
use op25_bridge::domain::{Command, Envelope};

pub struct Harness {
    pub ctx: BridgeContext,
    pub inbound: Arc<BoundedQueue<Envelope>>,
    pub commands: Arc<BoundedQueue<Command>>,
}

pub fn settings() -> BridgeSettings {
    BridgeSettings {
        poll_interval: Duration::from_millis(5),
        heartbeat: Duration::from_millis(50),
        settle_delay: Duration::from_millis(20),
        ..BridgeSettings::default()
    }
}

/// Context with a running watcher.
pub fn harness() -> Harness {
    let inbound = Arc::new(BoundedQueue::new(100));
    let commands = Arc::new(BoundedQueue::new(10));
    let mut ctx = BridgeContext::new(
        settings(),
        inbound.clone(),
        commands.clone(),
        Arc::new(FilesystemAssets::new("/nonexistent", "/nonexistent")),
    );
    ctx.spawn_watcher();
    Harness {
        ctx,
        inbound,
        commands,
    }
}

/// Splits an SSE byte stream into `\n\n`-terminated frames.
pub struct FrameReader<S> {
    stream: S,
    buf: String,
}

impl<S, E> FrameReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Debug,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: String::new(),
        }
    }

    /// Next raw frame, or `None` on timeout or end of stream.
    pub async fn next_frame(&mut self, wait: Duration) -> Option<String> {
        loop {
            if let Some(end) = self.buf.find("\n\n") {
                let frame = self.buf[..end].to_string();
                self.buf.drain(..end + 2);
                return Some(frame);
            }
            let chunk = tokio::time::timeout(wait, self.stream.next()).await.ok()??;
            self.buf
                .push_str(std::str::from_utf8(&chunk.expect("stream error")).expect("utf-8"));
        }
    }

    /// Next `data:` frame as JSON, skipping keep-alive comments.
    pub async fn next_data(&mut self, wait: Duration) -> Option<Value> {
        loop {
            let frame = self.next_frame(wait).await?;
            if let Some(data) = data_of(&frame) {
                return Some(data);
            }
        }
    }
}

/// Parse the `data:` line of a frame; `None` for comment frames.
pub fn data_of(frame: &str) -> Option<Value> {
    frame
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .map(|json| serde_json::from_str(json.trim()).expect("frame data is JSON"))
}
