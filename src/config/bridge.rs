//! Bridge, SSE, command and static asset configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;

/// Upper bound for the command settle delay
const MAX_SETTLE_DELAY_MS: u64 = 10_000;

/// Queue watcher and queue sizing
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Sleep between polls of an empty inbound queue
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Capacity of the in-process inbound queue
    #[serde(default = "default_inbound_capacity")]
    pub inbound_capacity: usize,

    /// Capacity of the response queue drained by `POST /`
    #[serde(default = "default_response_capacity")]
    pub response_capacity: usize,

    /// Capacity of the outbound command queue
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

impl BridgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::ZeroValue("bridge.poll_interval_ms"));
        }
        if self.inbound_capacity == 0 {
            return Err(ValidationError::ZeroValue("bridge.inbound_capacity"));
        }
        if self.response_capacity == 0 {
            return Err(ValidationError::ZeroValue("bridge.response_capacity"));
        }
        if self.command_capacity == 0 {
            return Err(ValidationError::ZeroValue("bridge.command_capacity"));
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            inbound_capacity: default_inbound_capacity(),
            response_capacity: default_response_capacity(),
            command_capacity: default_command_capacity(),
        }
    }
}

/// SSE endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SseConfig {
    /// Idle time before a keep-alive comment is sent
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,

    /// Buffered deliveries per subscriber before it is dropped as too slow
    #[serde(default = "default_sink_capacity")]
    pub sink_capacity: usize,
}

impl SseConfig {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.heartbeat_ms == 0 {
            return Err(ValidationError::ZeroValue("sse.heartbeat_ms"));
        }
        if self.sink_capacity == 0 {
            return Err(ValidationError::ZeroValue("sse.sink_capacity"));
        }
        Ok(())
    }
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            heartbeat_ms: default_heartbeat_ms(),
            sink_capacity: default_sink_capacity(),
        }
    }
}

/// Command endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    /// Wait between forwarding commands and draining responses
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl CommandConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(ValidationError::SettleDelayTooLong);
        }
        Ok(())
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// Static asset directories
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
}

impl AssetConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.static_dir.as_os_str().is_empty() {
            return Err(ValidationError::EmptyAssetDir("assets.static_dir"));
        }
        if self.image_dir.as_os_str().is_empty() {
            return Err(ValidationError::EmptyAssetDir("assets.image_dir"));
        }
        Ok(())
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
            image_dir: default_image_dir(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_inbound_capacity() -> usize {
    100
}

fn default_response_capacity() -> usize {
    10
}

fn default_command_capacity() -> usize {
    10
}

fn default_heartbeat_ms() -> u64 {
    1_000
}

fn default_sink_capacity() -> usize {
    64
}

fn default_settle_delay_ms() -> u64 {
    200
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("../www/www-static")
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("../www/images")
}
