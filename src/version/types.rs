//! Common types for the release data model

use chrono::{DateTime, Utc};

use crate::version::channel::channel_of;

/// A published release in the catalog
///
/// Instances are produced by a backend and normalized by the catalog; the
/// core only ever reads an immutable snapshot of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    /// Semantic version tag (e.g. "1.2.0-beta.1")
    pub tag: String,
    /// Release track derived from the tag's prerelease ("stable" when none)
    pub channel: String,
    /// Release notes text
    pub notes: String,
    /// Publish timestamp
    pub published_at: DateTime<Utc>,
    /// Downloadable files attached to this release
    pub assets: Vec<Asset>,
}

impl Version {
    /// Build a version from a tag, deriving its channel
    ///
    /// Fails when the tag is not a valid semantic version.
    pub fn try_new(tag: &str, published_at: DateTime<Utc>) -> Result<Self, semver::Error> {
        let parsed = semver::Version::parse(tag)?;
        Ok(Self {
            tag: tag.to_string(),
            channel: channel_of(&parsed),
            notes: String::new(),
            published_at,
            assets: Vec::new(),
        })
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }

    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Find an asset by its exact filename
    pub fn asset_named(&self, filename: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.filename == filename)
    }

    /// Whether at least one asset targets the given platform
    pub fn has_platform(&self, platform: &str) -> bool {
        self.assets.iter().any(|a| a.platform == platform)
    }
}

/// A downloadable file attached to exactly one version
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// File name as published
    pub filename: String,
    /// Canonical platform identifier (e.g. "osx_64", "windows_32")
    pub platform: String,
    /// File size in bytes
    pub size: u64,
    /// Backend-owned locator used to read the file's bytes; empty for
    /// backends that address assets by filename alone
    pub url: String,
}

impl Asset {
    pub fn new(filename: &str, platform: &str, size: u64) -> Self {
        Self {
            filename: filename.to_string(),
            platform: platform.to_string(),
            size,
            url: String::new(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_derives_channel_from_tag() {
        let version = Version::try_new("1.2.0-beta.1", Utc::now()).unwrap();
        assert_eq!(version.channel, "beta");

        let stable = Version::try_new("1.2.0", Utc::now()).unwrap();
        assert_eq!(stable.channel, "stable");
    }

    #[test]
    fn try_new_rejects_invalid_tags() {
        assert!(Version::try_new("v1.2.0", Utc::now()).is_err());
        assert!(Version::try_new("latest", Utc::now()).is_err());
    }

    #[test]
    fn asset_lookup_by_name_and_platform() {
        let version = Version::try_new("1.0.0", Utc::now())
            .unwrap()
            .with_asset(Asset::new("app-1.0.0.dmg", "osx_64", 1024))
            .with_asset(Asset::new("RELEASES", "windows_32", 64));

        assert!(version.asset_named("RELEASES").is_some());
        assert!(version.asset_named("releases").is_none());
        assert!(version.has_platform("osx_64"));
        assert!(!version.has_platform("linux_64"));
    }
}
