//! Commands submitted over HTTP for the receiver control plane.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::envelope::MessageKind;

/// One decoded command item.
///
/// Arguments are doubles on the control-plane side, so they are kept as
/// `f64` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub command: String,
    pub arg1: f64,
    pub arg2: f64,
}

impl Command {
    pub fn new(command: impl Into<String>, arg1: f64, arg2: f64) -> Self {
        Self {
            command: command.into(),
            arg1,
            arg2,
        }
    }

    /// Message kind used when the command is placed on the outbound queue.
    pub fn kind(&self) -> MessageKind {
        MessageKind::Command
    }
}

/// Reasons a request body is rejected as a command batch.
#[derive(Debug, Error)]
pub enum CommandBatchError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("request body is not a JSON array")]
    NotAnArray,

    #[error("command #{index} is malformed: {source}")]
    MalformedCommand {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A fully validated batch of commands.
///
/// Either every item validated or the batch does not exist; there is no
/// partial batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBatch(Vec<Command>);

impl CommandBatch {
    /// Parses a request body into a batch.
    pub fn parse(body: &[u8]) -> Result<Self, CommandBatchError> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(CommandBatchError::InvalidJson)?;

        let serde_json::Value::Array(items) = value else {
            return Err(CommandBatchError::NotAnArray);
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<Command>(item)
                    .map_err(|source| CommandBatchError::MalformedCommand { index, source })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.0.iter()
    }
}

impl IntoIterator for CommandBatch {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
