//! Writes forwarded commands to an output stream as JSON lines.
//!
//! Line shape: `{"type": -2, "command": "...", "arg1": 0.0, "arg2": 0.0}`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::adapters::queue::BoundedQueue;
use crate::domain::{Command, MessageKind};

#[derive(Serialize)]
struct CommandLine<'a> {
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(flatten)]
    command: &'a Command,
}

/// Encode one command as a newline-terminated JSON line.
pub fn encode_line(command: &Command) -> serde_json::Result<Vec<u8>> {
    let mut line = serde_json::to_vec(&CommandLine {
        kind: command.kind(),
        command,
    })?;
    line.push(b'\n');
    Ok(line)
}

/// Drain `queue` into `out` until the queue closes or shutdown is requested.
///
/// Returns the number of lines written.
pub async fn write_commands<W>(
    queue: Arc<BoundedQueue<Command>>,
    mut out: W,
    poll_interval: Duration,
    shutdown: CancellationToken,
) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    loop {
        match queue.try_pop() {
            Ok(Some(command)) => {
                match encode_line(&command) {
                    Ok(line) => {
                        out.write_all(&line).await?;
                        out.flush().await?;
                        written += 1;
                    }
                    Err(e) => tracing::warn!(command = %command.command, "Unencodable command: {}", e),
                }
            }
            Ok(None) => {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
            Err(_) => break,
        }
    }
    tracing::debug!(written, "Command writer stopped");
    Ok(written)
}
