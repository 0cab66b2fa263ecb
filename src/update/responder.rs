//! Update-check orchestration
//!
//! [`UpdateService`] answers the two supported update-check protocols over
//! an immutable catalog snapshot: the generic JSON check used by
//! Squirrel.Mac-style clients, and the windows manifest check that rewrites
//! a `RELEASES` file so package URLs point back through the server's
//! download proxy. It also resolves plain download requests to a concrete
//! version/asset pair, wrapped in the `download` hook chain.
//!
//! Checks carry the absolute URL they were requested under; download URLs in
//! responses are built from it by climbing a fixed number of path segments,
//! which keeps any route prefix the embedding server mounted us under.

use std::sync::Arc;
use std::time::Duration;

use chrono::SecondsFormat;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::backend::{self, AssetPayload, Backend, BackendError};
use crate::catalog::Catalog;
use crate::config::ServerConfig;
use crate::hooks::{DOWNLOAD_EVENT, HookEvent, Hooks};
use crate::manifest::ReleasesManifest;
use crate::update::error::{InitError, UpdateError};
use crate::update::{notes, platforms};
use crate::update::platforms::Platform;
use crate::version::selector::{self, LATEST_TAG, Op, TagConstraint};
use crate::version::types::{Asset, Version};

/// Filename of the windows manifest asset
pub const RELEASES_FILENAME: &str = "RELEASES";

// Path segments between the mount point and each endpoint, i.e. how far a
// response URL must climb from the request URL to reach the mount point.
const UPDATE_ROUTE_DEPTH: usize = 3; // update/<platform>/<version>
const UPDATE_CHANNEL_ROUTE_DEPTH: usize = 5; // update/channel/<channel>/<platform>/<version>
const RELEASES_ROUTE_DEPTH: usize = 4; // update/<platform>/<version>/RELEASES
const RELEASES_CHANNEL_ROUTE_DEPTH: usize = 6;

/// An update-check request, either protocol
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    /// Absolute URL the check was requested under
    pub url: String,
    /// Client's current version tag
    pub tag: String,
    /// Client's platform identifier
    pub platform: String,
    /// Channel named in the route, when the route carries one
    pub channel: Option<String>,
    /// Wanted download filetype (generic check only)
    pub filetype: Option<String>,
}

/// A download-resolution request
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    /// Version tag to download, or `latest` (also the default when empty)
    pub tag: String,
    /// Platform identifier; not needed when a filename is given
    pub platform: Option<String>,
    /// Channel named in the route, when the route carries one
    pub channel: Option<String>,
    /// Exact asset filename to serve
    pub filename: Option<String>,
    /// Preferred filetype when picking an asset by platform
    pub filetype: Option<String>,
}

/// Outcome of a generic update check
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateDecision {
    /// Client is up to date; maps to an empty 204-style response
    NoUpdate,
    /// A newer build exists
    UpdateAvailable(UpdateInfo),
}

/// Wire payload of a positive generic check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateInfo {
    /// Absolute download URL for the winning build
    pub url: String,
    /// Winning version tag
    pub name: String,
    /// Merged release notes over every version newer than the client's
    pub notes: String,
    /// Publish timestamp of the winning version, ISO-8601
    pub pub_date: String,
}

/// Rewritten manifest returned to windows clients as a named attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestResponse {
    pub filename: String,
    pub content_length: u64,
    pub body: Vec<u8>,
}

/// The update-check and release-resolution service
///
/// Every request method takes `&self` and computes over an immutable
/// snapshot, so one instance serves arbitrarily many concurrent requests.
pub struct UpdateService {
    backend: Arc<dyn Backend>,
    catalog: Catalog,
    hooks: Hooks,
    manifest: ReleasesManifest,
    config: ServerConfig,
    init_outcome: OnceCell<Result<(), InitError>>,
}

impl UpdateService {
    /// Create a service with the backend named in the configuration
    pub fn new(config: ServerConfig) -> Result<Self, BackendError> {
        let backend = backend::create_backend(&config)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Create a service over an explicit backend instance
    pub fn with_backend(config: ServerConfig, backend: Arc<dyn Backend>) -> Self {
        let catalog = Catalog::new(backend.clone(), Duration::from_millis(config.cache.ttl_ms));
        Self {
            backend,
            catalog,
            hooks: Hooks::new(),
            manifest: ReleasesManifest::new(),
            config,
            init_outcome: OnceCell::new(),
        }
    }

    /// Interceptor registry, for wiring hooks before serving traffic
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// One-time initialization shared by all callers
    ///
    /// The first caller initializes the backend and optionally prefetches
    /// the catalog; the completed outcome, success or failure, is cached and
    /// returned to every later and concurrent caller.
    pub async fn init(&self) -> Result<(), UpdateError> {
        let outcome = self
            .init_outcome
            .get_or_init(|| async {
                info!("Initializing {} backend", self.backend.name());
                if let Err(err) = self.backend.init().await {
                    return Err(InitError::Backend(Arc::new(err)));
                }

                if self.config.update.pre_fetch {
                    self.catalog.list().await?;
                }
                Ok(())
            })
            .await;

        outcome.clone().map_err(UpdateError::from)
    }

    /// Generic update check
    ///
    /// Resolves the newest version at or above the client's, on the
    /// requested channel and platform. Yields [`UpdateDecision::NoUpdate`]
    /// when nothing newer exists.
    pub async fn check_update(&self, request: &CheckRequest) -> Result<UpdateDecision, UpdateError> {
        self.init().await?;

        let tag = required(&request.tag, "version")?;
        let platform_name = required(&request.platform, "platform")?;
        let platform = platforms::detect(platform_name)
            .ok_or_else(|| UpdateError::UnknownPlatform(platform_name.to_string()))?;

        let current =
            semver::Version::parse(tag).map_err(|_| UpdateError::InvalidTag(tag.to_string()))?;
        let constraint = TagConstraint::Cmp(Op::Ge, current.clone());

        let snapshot = self.catalog.list().await?;
        let versions = selector::filter(
            &constraint,
            self.effective_channel(&request.channel),
            Some(platform.as_str()),
            &snapshot,
        );

        let Some(latest) = versions.first() else {
            return Ok(UpdateDecision::NoUpdate);
        };
        if latest.tag == tag {
            debug!("Client is already on {}", tag);
            return Ok(UpdateDecision::NoUpdate);
        }

        let newer: Vec<Version> = versions
            .iter()
            .filter(|v| {
                semver::Version::parse(&v.tag).is_ok_and(|parsed| parsed > current)
            })
            .cloned()
            .collect();

        let climb = if request.channel.is_some() {
            UPDATE_CHANNEL_ROUTE_DEPTH
        } else {
            UPDATE_ROUTE_DEPTH
        };
        let filetype = request
            .filetype
            .as_deref()
            .unwrap_or(&self.config.update.default_filetype);
        let url = rewrite_url(
            &request.url,
            climb,
            &format!("download/version/{}/{}", latest.tag, platform.as_str()),
            Some(&format!("filetype={filetype}")),
        )?;

        info!("Update available: {} -> {}", tag, latest.tag);
        Ok(UpdateDecision::UpdateAvailable(UpdateInfo {
            url,
            name: latest.tag.clone(),
            notes: notes::merge(&newer, false),
            pub_date: latest
                .published_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }))
    }

    /// Windows manifest check
    ///
    /// Serves the winning version's `RELEASES` manifest with every package
    /// filename rewritten into an absolute download-proxy URL. Unlike the
    /// generic check, an empty resolution is an error here: the windows
    /// client expects a manifest or a failure, never an empty body.
    pub async fn check_update_win(
        &self,
        request: &CheckRequest,
    ) -> Result<ManifestResponse, UpdateError> {
        self.init().await?;

        let tag = required(&request.tag, "version")?;
        // The manifest protocol only exists for the windows client family;
        // the advertised platform is not trusted.
        let platform = Platform::Windows32;

        let constraint = TagConstraint::at_least(tag)?;
        let snapshot = self.catalog.list().await?;
        let versions = selector::filter(
            &constraint,
            self.effective_channel(&request.channel),
            Some(platform.as_str()),
            &snapshot,
        );
        let latest = versions.first().ok_or(UpdateError::VersionNotFound)?;

        let asset = latest
            .asset_named(RELEASES_FILENAME)
            .ok_or_else(|| UpdateError::AssetNotFound(RELEASES_FILENAME.to_string()))?;
        let raw = self.backend.read_asset(asset).await?;

        let climb = if request.channel.is_some() {
            RELEASES_CHANNEL_ROUTE_DEPTH
        } else {
            RELEASES_ROUTE_DEPTH
        };

        let mut entries = self.manifest.parse(&String::from_utf8_lossy(&raw));
        for entry in &mut entries {
            let filename = entry.filename.take().unwrap_or_default();
            entry.filename = Some(rewrite_url(
                &request.url,
                climb,
                &format!("download/{}/{}", entry.semver, filename),
                None,
            )?);
        }

        let body = self.manifest.generate(&entries).into_bytes();
        debug!(
            "Serving rewritten manifest for {} ({} entries)",
            latest.tag,
            entries.len()
        );
        Ok(ManifestResponse {
            filename: RELEASES_FILENAME.to_string(),
            content_length: body.len() as u64,
            body,
        })
    }

    /// Resolve a download request to a concrete version and asset
    ///
    /// A `latest` request prefers the requested channel and falls back to
    /// any channel when none was explicitly named; a pinned tag is matched
    /// exactly across all channels.
    pub async fn resolve_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<(Version, Asset), UpdateError> {
        self.init().await?;

        let tag = match request.tag.trim() {
            "" => LATEST_TAG,
            tag => tag,
        };

        // When an exact filename is requested the platform axis is skipped
        let platform = match &request.filename {
            Some(_) => None,
            None => {
                let name = request
                    .platform
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or(UpdateError::MissingParameter("platform"))?;
                Some(
                    platforms::detect(name)
                        .ok_or_else(|| UpdateError::UnknownPlatform(name.to_string()))?,
                )
            }
        };

        let snapshot = self.catalog.list().await?;
        let version = selector::resolve_with_fallback(
            tag,
            self.effective_channel(&request.channel),
            request.channel.is_some(),
            platform.map(|p| p.as_str()),
            &snapshot,
        )?;

        let asset = match (&request.filename, platform) {
            (Some(filename), _) => version.asset_named(filename),
            (None, Some(platform)) => {
                platforms::resolve_asset(&version, platform, request.filetype.as_deref())
            }
            (None, None) => None,
        }
        .ok_or_else(|| {
            UpdateError::AssetNotFound(
                request
                    .filename
                    .clone()
                    .unwrap_or_else(|| format!("{} for {}", version.tag, describe(platform))),
            )
        })?
        .clone();

        Ok((version, asset))
    }

    /// Resolve a download and produce its payload, wrapped in the
    /// `download` hook chain
    pub async fn serve_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<AssetPayload, UpdateError> {
        let (version, asset) = self.resolve_download(request).await?;

        let event = HookEvent::new(DOWNLOAD_EVENT)
            .with_tag(&version.tag)
            .with_filename(&asset.filename)
            .with_platform(&asset.platform);

        self.hooks
            .perform(&event, async {
                self.backend
                    .serve_asset(&asset)
                    .await
                    .map_err(UpdateError::from)
            })
            .await
    }

    fn effective_channel<'a>(&'a self, requested: &'a Option<String>) -> &'a str {
        requested
            .as_deref()
            .unwrap_or(&self.config.update.default_channel)
    }
}

fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str, UpdateError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(UpdateError::MissingParameter(name));
    }
    Ok(value)
}

fn describe(platform: Option<Platform>) -> &'static str {
    platform.map(|p| p.as_str()).unwrap_or("any platform")
}

/// Build an absolute URL from a request URL by climbing `climb` path
/// segments and appending a new path (and optional query)
///
/// Climbing stops at the root, and any prefix segments the embedding server
/// mounted the routes under are preserved. Query and fragment of the
/// request URL are discarded.
fn rewrite_url(
    base: &str,
    climb: usize,
    path: &str,
    query: Option<&str>,
) -> Result<String, UpdateError> {
    let mut url = reqwest::Url::parse(base)
        .map_err(|err| UpdateError::InvalidUrl(format!("{base}: {err}")))?;

    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let keep = segments.len().saturating_sub(climb);

    {
        let mut editor = url
            .path_segments_mut()
            .map_err(|()| UpdateError::InvalidUrl(base.to_string()))?;
        editor.clear();
        for segment in &segments[..keep] {
            editor.push(segment);
        }
        for segment in path.split('/') {
            editor.push(segment);
        }
    }
    url.set_query(query);
    url.set_fragment(None);

    Ok(url.to_string())
}
