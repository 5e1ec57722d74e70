//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `OP25_BRIDGE` prefix and nested values use double underscores as separators.
//! Every value has a default, so an empty environment yields a working setup.
//!
//! # Example
//!
//! ```no_run
//! use op25_bridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod bridge;
mod error;
mod server;

pub use bridge::{AssetConfig, BridgeConfig, CommandConfig, SseConfig};
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, log filter)
    #[serde(default)]
    pub server: ServerConfig,

    /// Queue watcher and queue capacities
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// SSE keep-alive and per-subscriber buffering
    #[serde(default)]
    pub sse: SseConfig,

    /// Command endpoint timing
    #[serde(default)]
    pub commands: CommandConfig,

    /// Static asset directories
    #[serde(default)]
    pub assets: AssetConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `OP25_BRIDGE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `OP25_BRIDGE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `OP25_BRIDGE__SSE__HEARTBEAT_MS=500` -> `sse.heartbeat_ms = 500`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("OP25_BRIDGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.bridge.validate()?;
        self.sse.validate()?;
        self.commands.validate()?;
        self.assets.validate()?;
        Ok(())
    }
}
