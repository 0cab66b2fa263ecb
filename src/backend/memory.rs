//! In-process backend holding releases and asset bytes in memory
//!
//! Useful for tests and for embedding the update service in applications
//! that already know their release list. Asset bytes are keyed by the
//! asset's `url` locator when set, falling back to its filename; give
//! assets distinct locators (e.g. `<tag>/<filename>`) when several versions
//! publish a file with the same name, as the windows manifest does.

use std::collections::HashMap;

use crate::backend::{Backend, BackendError};
use crate::version::types::{Asset, Version};

/// Backend implementation over in-memory fixtures
#[derive(Default)]
pub struct MemoryBackend {
    versions: Vec<Version>,
    files: HashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.versions.push(version);
        self
    }

    /// Register the bytes served for an asset locator
    pub fn with_file(mut self, key: &str, content: &[u8]) -> Self {
        self.files.insert(key.to_string(), content.to_vec());
        self
    }

    fn key_for(asset: &Asset) -> &str {
        if asset.url.is_empty() {
            &asset.filename
        } else {
            &asset.url
        }
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_versions(&self) -> Result<Vec<Version>, BackendError> {
        Ok(self.versions.clone())
    }

    async fn read_asset(&self, asset: &Asset) -> Result<Vec<u8>, BackendError> {
        self.files
            .get(Self::key_for(asset))
            .cloned()
            .ok_or_else(|| BackendError::NotFound(asset.filename.clone()))
    }
}
