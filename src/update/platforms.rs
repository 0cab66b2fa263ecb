//! Platform identifiers, alias normalization and asset selection
//!
//! Clients and packaging tools are sloppy about platform names: update
//! requests say `darwin` or `win32`, filenames say `-mac.zip` or
//! `-linux-x86_64.AppImage`. Everything is normalized to one canonical
//! identifier per platform before it is used for filtering.

use crate::version::types::{Asset, Version};

/// Preference order used when no explicit filetype is requested
const FILETYPE_PREFERENCE: [&str; 8] = [
    ".exe", ".dmg", ".deb", ".rpm", ".tgz", ".tar.gz", ".zip", ".nupkg",
];

/// Canonical platform of a release asset or update request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux32,
    Linux64,
    Osx64,
    Windows32,
    Windows64,
}

impl Platform {
    /// Returns the canonical identifier of the platform
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux32 => "linux_32",
            Platform::Linux64 => "linux_64",
            Platform::Osx64 => "osx_64",
            Platform::Windows32 => "windows_32",
            Platform::Windows64 => "windows_64",
        }
    }
}

/// Detect a platform from an identifier or a filename
///
/// Accepts request identifiers (`osx`, `darwin`, `win64`, `linux_32`) as
/// well as published filenames (`app-1.0.0-mac.zip`, `app.exe`,
/// `RELEASES`). Returns `None` when nothing matches.
pub fn detect(name: &str) -> Option<Platform> {
    let name = name.to_lowercase();

    // Squirrel.Windows artifacts carry no platform hint in their names
    if name == "releases" || name.ends_with(".nupkg") {
        return Some(Platform::Windows32);
    }

    // osx before windows: "darwin" contains "win"
    if name.contains("darwin")
        || name.contains("mac")
        || name.contains("osx")
        || name.ends_with(".dmg")
        || name.ends_with(".pkg")
    {
        return Some(Platform::Osx64);
    }

    if name.contains("win") || name.ends_with(".exe") || name.ends_with(".msi") {
        return Some(if name.contains("64") {
            Platform::Windows64
        } else {
            Platform::Windows32
        });
    }

    if name.contains("linux")
        || name.contains("ubuntu")
        || name.ends_with(".deb")
        || name.ends_with(".rpm")
        || name.ends_with(".tgz")
        || name.ends_with(".tar.gz")
        || name.ends_with(".appimage")
    {
        return Some(
            if name.contains("32") || name.contains("ia32") || name.contains("i386") {
                Platform::Linux32
            } else {
                Platform::Linux64
            },
        );
    }

    None
}

/// Pick the asset to serve for a platform
///
/// A wanted filetype (with or without a leading dot) wins when an asset
/// matches it; otherwise assets are ranked by the fixed filetype preference
/// order, earliest listed first.
pub fn resolve_asset<'a>(
    version: &'a Version,
    platform: Platform,
    wanted: Option<&str>,
) -> Option<&'a Asset> {
    let candidates: Vec<&Asset> = version
        .assets
        .iter()
        .filter(|a| a.platform == platform.as_str())
        .collect();

    if let Some(wanted) = wanted {
        let wanted = if wanted.starts_with('.') {
            wanted.to_lowercase()
        } else {
            format!(".{}", wanted.to_lowercase())
        };
        if let Some(found) = candidates
            .iter()
            .find(|a| a.filename.to_lowercase().ends_with(&wanted))
        {
            return Some(found);
        }
    }

    candidates.into_iter().min_by_key(|a| {
        let filename = a.filename.to_lowercase();
        FILETYPE_PREFERENCE
            .iter()
            .position(|ext| filename.ends_with(ext))
            .unwrap_or(FILETYPE_PREFERENCE.len())
    })
}
