//! AssetResolver port - static files served next to the bridge endpoints.

use async_trait::async_trait;
use thiserror::Error;

/// A resolved static asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("asset read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for resolving request paths to static content.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Resolves a request path such as `/` or `/main.js`.
    async fn resolve(&self, path: &str) -> Result<Asset, AssetError>;
}
