//! Standard stream adapters for running the bridge as a standalone process.
//!
//! - `feed` - stdin JSON lines into the inbound queue
//! - `writer` - forwarded commands out to stdout

mod feed;
mod writer;

pub use feed::{parse_line, pump_lines, FeedError, FeedSummary};
pub use writer::{encode_line, write_commands};
