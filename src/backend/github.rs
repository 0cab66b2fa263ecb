//! GitHub Releases backend
//!
//! Maps a repository's releases to the catalog data model: the release tag
//! becomes the version (a leading `v` is tolerated), the release body its
//! notes, and every uploaded file whose platform can be detected from its
//! name becomes an asset.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::backend::{Backend, BackendError};
use crate::config::GitHubConfig;
use crate::update::platforms;
use crate::version::types::{Asset, Version};

/// Default base URL for the GitHub API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Maximum releases fetched per page (GitHub API limit)
const PER_PAGE: u32 = 100;

/// Response item from the GitHub releases API
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    draft: bool,
    body: Option<String>,
    published_at: Option<String>,
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    size: u64,
    /// API URL serving the asset bytes with an octet-stream accept header
    url: String,
}

/// Backend implementation for the GitHub Releases API
pub struct GitHubBackend {
    client: reqwest::Client,
    base_url: String,
    repository: String,
    token: Option<String>,
}

impl GitHubBackend {
    /// Creates a backend from its configuration section
    ///
    /// The repository must be given as `owner/name`.
    pub fn from_config(config: &GitHubConfig) -> Result<Self, BackendError> {
        let (owner, name) = config
            .repository
            .split_once('/')
            .ok_or_else(|| {
                BackendError::Configuration(format!(
                    "Repository must be \"owner/name\", got: {:?}",
                    config.repository
                ))
            })?;
        if owner.is_empty() || name.is_empty() {
            return Err(BackendError::Configuration(format!(
                "Repository must be \"owner/name\", got: {:?}",
                config.repository
            )));
        }

        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("update-server")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: config.base_url.clone(),
            repository: config.repository.clone(),
            token: config.token.clone(),
        })
    }

    fn request(&self, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url).header("Accept", accept);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request
    }

    /// Map one API release to a catalog version, or None when it is a draft
    /// or its tag is not a semantic version
    fn to_version(&self, release: Release) -> Option<Version> {
        if release.draft {
            return None;
        }

        let tag = release.tag_name.trim_start_matches('v');
        let published_at = release
            .published_at
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default();

        let mut version = match Version::try_new(tag, published_at) {
            Ok(version) => version,
            Err(_) => {
                warn!("Skipping release with non-semver tag: {}", release.tag_name);
                return None;
            }
        };

        version.notes = release.body.unwrap_or_default();
        for asset in release.assets {
            let Some(platform) = platforms::detect(&asset.name) else {
                debug!("Skipping asset with undetectable platform: {}", asset.name);
                continue;
            };
            version.assets.push(
                Asset::new(&asset.name, platform.as_str(), asset.size).with_url(&asset.url),
            );
        }

        Some(version)
    }
}

#[async_trait::async_trait]
impl Backend for GitHubBackend {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn list_versions(&self) -> Result<Vec<Version>, BackendError> {
        let url = format!(
            "{}/repos/{}/releases?per_page={PER_PAGE}",
            self.base_url, self.repository
        );

        let response = self
            .request(&url, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(self.repository.clone()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(BackendError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(BackendError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let releases: Vec<Release> = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub releases response: {}", e);
            BackendError::InvalidResponse(e.to_string())
        })?;

        Ok(releases
            .into_iter()
            .filter_map(|release| self.to_version(release))
            .collect())
    }

    async fn read_asset(&self, asset: &Asset) -> Result<Vec<u8>, BackendError> {
        let response = self
            .request(&asset.url, "application/octet-stream")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(asset.filename.clone()));
        }

        if !status.is_success() {
            warn!("GitHub asset download returned status {}: {}", status, asset.url);
            return Err(BackendError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
