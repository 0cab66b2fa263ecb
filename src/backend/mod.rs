//! Release-storage backends
//!
//! A backend is where published releases actually live. The rest of the
//! crate only talks to the [`Backend`] trait: listing versions for the
//! catalog and reading or serving individual asset bytes. Backends form a
//! closed set chosen once by name at construction time.
//!
//! # Modules
//!
//! - [`github`]: GitHub Releases API backend
//! - [`memory`]: in-process backend for tests and embedding

pub mod github;
pub mod memory;

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::version::types::{Asset, Version};

pub use github::GitHubBackend;
pub use memory::MemoryBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid backend configuration: {0}")]
    Configuration(String),

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),
}

/// An asset ready to be streamed to a client by the embedding server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPayload {
    pub filename: String,
    pub content_length: u64,
    pub body: Vec<u8>,
}

/// Trait for reading releases and their files from wherever they live
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Returns the name this backend is registered under
    fn name(&self) -> &'static str;

    /// One-time backend initialization (credential checks, warmup)
    async fn init(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Fetches every published version with its assets
    ///
    /// Ordering is not significant; the catalog sorts the snapshot.
    async fn list_versions(&self) -> Result<Vec<Version>, BackendError>;

    /// Reads the raw bytes of one asset
    async fn read_asset(&self, asset: &Asset) -> Result<Vec<u8>, BackendError>;

    /// Produces a servable payload for one asset
    async fn serve_asset(&self, asset: &Asset) -> Result<AssetPayload, BackendError> {
        let body = self.read_asset(asset).await?;
        Ok(AssetPayload {
            filename: asset.filename.clone(),
            content_length: body.len() as u64,
            body,
        })
    }
}

/// Construct the backend named in the configuration
///
/// The set of backends is closed; an unrecognized name is an error rather
/// than a fallback.
pub fn create_backend(config: &ServerConfig) -> Result<Arc<dyn Backend>, BackendError> {
    match config.backend.as_str() {
        "github" => Ok(Arc::new(GitHubBackend::from_config(&config.github)?)),
        "memory" => Ok(Arc::new(MemoryBackend::new())),
        other => Err(BackendError::UnknownBackend(other.to_string())),
    }
}
