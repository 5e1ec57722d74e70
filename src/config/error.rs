//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("Command settle delay exceeds maximum allowed (10000 ms)")]
    SettleDelayTooLong,

    #[error("Asset directory must not be empty: {0}")]
    EmptyAssetDir(&'static str),
}
