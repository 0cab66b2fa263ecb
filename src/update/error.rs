use std::sync::Arc;

use thiserror::Error;

use crate::backend::BackendError;
use crate::catalog::CatalogError;
use crate::hooks::HookError;
use crate::version::error::SelectError;

/// Outcome of the one-time service initialization
///
/// Cloneable because the cached outcome is handed to every caller.
#[derive(Debug, Clone, Error)]
pub enum InitError {
    #[error("Backend initialization failed: {0}")]
    Backend(#[source] Arc<BackendError>),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Invalid version tag: {0}")]
    InvalidTag(String),

    #[error("Invalid request url: {0}")]
    InvalidUrl(String),

    #[error("No version matching the requested constraint")]
    VersionNotFound,

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Hook(#[from] HookError),
}

impl From<SelectError> for UpdateError {
    fn from(err: SelectError) -> Self {
        match err {
            SelectError::InvalidConstraint(tag) => UpdateError::InvalidTag(tag),
            SelectError::VersionNotFound => UpdateError::VersionNotFound,
        }
    }
}
