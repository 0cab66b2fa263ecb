//! Bidirectional codec between semantic versions and the purely numeric
//! 4-field version scheme required by the windows packaging format
//!
//! The packaging format forbids textual prerelease tags, so a prerelease is
//! folded into a 4th numeric field: `rank(channel) * 1000 + counter`. Only
//! prereleases shaped `<channel>.<counter>` with a ranked channel name can be
//! represented; anything else is reported as unsupported instead of being
//! coerced into a wrong value.

use crate::version::channel::{CHANNEL_MAGNITUDE, Channel};
use crate::version::error::CodecError;

/// Encode a semantic version as a dotted numeric windows version
///
/// `1.2.3` encodes to `1.2.3`; `1.2.3-beta.4` encodes to `1.2.3.2004`.
pub fn encode(tag: &str) -> Result<String, CodecError> {
    let version = semver::Version::parse(tag)?;
    let base = format!("{}.{}.{}", version.major, version.minor, version.patch);

    if version.pre.is_empty() {
        return Ok(base);
    }

    let field = hash_prerelease(version.pre.as_str())?;
    Ok(format!("{base}.{field}"))
}

/// Decode a dotted numeric windows version back into a semantic version
///
/// A zero or non-numeric 4th field yields the bare three-field version.
pub fn decode(windows_version: &str) -> Result<String, CodecError> {
    let parts: Vec<&str> = windows_version.split('.').collect();
    if parts.len() < 3 || parts.iter().take(3).any(|p| p.parse::<u64>().is_err()) {
        return Err(CodecError::InvalidWindowsVersion(
            windows_version.to_string(),
        ));
    }

    let base = parts[..3].join(".");

    let field = match parts.get(3).and_then(|p| p.parse::<u64>().ok()) {
        Some(field) if field > 0 => field,
        _ => return Ok(base),
    };

    let rank = field / CHANNEL_MAGNITUDE;
    let channel =
        Channel::from_rank(rank).ok_or(CodecError::UnsupportedChannelField(field))?;
    let counter = field - rank * CHANNEL_MAGNITUDE;

    Ok(format!("{base}-{}.{counter}", channel.as_str()))
}

/// Fold a prerelease into the 4th numeric field
///
/// Supported shape is `<ranked channel>[.<counter>]` with an integer counter
/// below the channel magnitude; the counter defaults to 0 when absent.
fn hash_prerelease(prerelease: &str) -> Result<u64, CodecError> {
    let mut identifiers = prerelease.split('.');

    let channel = identifiers
        .next()
        .and_then(|name| name.parse::<Channel>().ok())
        .ok_or_else(|| CodecError::UnsupportedPrerelease(prerelease.to_string()))?;

    let counter = match identifiers.next() {
        Some(counter) => counter
            .parse::<u64>()
            .ok()
            .filter(|c| *c < CHANNEL_MAGNITUDE)
            .ok_or_else(|| CodecError::UnsupportedPrerelease(prerelease.to_string()))?,
        None => 0,
    };

    if identifiers.next().is_some() {
        return Err(CodecError::UnsupportedPrerelease(prerelease.to_string()));
    }

    Ok(channel.rank() * CHANNEL_MAGNITUDE + counter)
}
