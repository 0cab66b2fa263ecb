//! Version filtering and resolution over a catalog snapshot
//!
//! Filtering combines three independent axes: a tag constraint (wildcard or
//! comparison against a semantic version), a channel (wildcard or exact track
//! name), and a platform (at least one asset for it). Results are always
//! ordered strictly descending by semantic-version precedence.

use crate::version::channel::WILDCARD_CHANNEL;
use crate::version::error::SelectError;
use crate::version::types::Version;

/// Tag requested by clients that want the newest matching version
pub const LATEST_TAG: &str = "latest";

/// Comparison operator of a tag constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
}

/// Constraint on the version tag: a wildcard or a comparison
///
/// This is a plain semantic-version comparison, not an npm-style range:
/// prerelease versions participate in the ordering like any other version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagConstraint {
    Any,
    Cmp(Op, semver::Version),
}

impl TagConstraint {
    /// Constraint retaining versions at or above the given tag
    pub fn at_least(tag: &str) -> Result<Self, SelectError> {
        let version = semver::Version::parse(tag)
            .map_err(|_| SelectError::InvalidConstraint(tag.to_string()))?;
        Ok(TagConstraint::Cmp(Op::Ge, version))
    }

    /// Whether a parsed version satisfies this constraint
    pub fn matches(&self, version: &semver::Version) -> bool {
        match self {
            TagConstraint::Any => true,
            TagConstraint::Cmp(op, bound) => match op {
                Op::Ge => version >= bound,
                Op::Gt => version > bound,
                Op::Le => version <= bound,
                Op::Lt => version < bound,
                Op::Eq => version == bound,
            },
        }
    }
}

impl std::str::FromStr for TagConstraint {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "*" || s == LATEST_TAG {
            return Ok(TagConstraint::Any);
        }

        let (op, rest) = if let Some(rest) = s.strip_prefix(">=") {
            (Op::Ge, rest)
        } else if let Some(rest) = s.strip_prefix("<=") {
            (Op::Le, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (Op::Gt, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (Op::Lt, rest)
        } else if let Some(rest) = s.strip_prefix('=') {
            (Op::Eq, rest)
        } else {
            // A bare tag pins that exact version
            (Op::Eq, s)
        };

        let version = semver::Version::parse(rest.trim())
            .map_err(|_| SelectError::InvalidConstraint(s.to_string()))?;
        Ok(TagConstraint::Cmp(op, version))
    }
}

/// Filter a snapshot by tag constraint, channel and platform
///
/// `channel` is `*` for any track or an exact track name. `platform` keeps
/// only versions carrying at least one asset for it; the asset lists of the
/// returned versions are never narrowed. The result is strictly descending
/// by semantic-version precedence.
pub fn filter(
    constraint: &TagConstraint,
    channel: &str,
    platform: Option<&str>,
    snapshot: &[Version],
) -> Vec<Version> {
    let mut matched: Vec<(semver::Version, &Version)> = snapshot
        .iter()
        .filter_map(|v| semver::Version::parse(&v.tag).ok().map(|parsed| (parsed, v)))
        .filter(|(parsed, _)| constraint.matches(parsed))
        .filter(|(_, v)| channel == WILDCARD_CHANNEL || v.channel == channel)
        .filter(|(_, v)| platform.is_none_or(|p| v.has_platform(p)))
        .collect();

    matched.sort_by(|(a, _), (b, _)| b.cmp(a));
    matched.into_iter().map(|(_, v)| v.clone()).collect()
}

/// Resolve the single best version matching the filter
pub fn resolve(
    constraint: &TagConstraint,
    channel: &str,
    platform: Option<&str>,
    snapshot: &[Version],
) -> Result<Version, SelectError> {
    filter(constraint, channel, platform, snapshot)
        .into_iter()
        .next()
        .ok_or(SelectError::VersionNotFound)
}

/// Resolve a download request, falling back to any channel when allowed
///
/// A specific tag pin overrides channel gating entirely: the constraint
/// becomes an exact match against all channels and never falls back. A
/// `latest` request is resolved against the preferred channel first; when
/// that fails and the caller did not explicitly request a channel, resolution
/// is retried once against the wildcard channel.
pub fn resolve_with_fallback(
    tag: &str,
    channel: &str,
    channel_explicit: bool,
    platform: Option<&str>,
    snapshot: &[Version],
) -> Result<Version, SelectError> {
    if tag != LATEST_TAG {
        let constraint: TagConstraint = tag.parse()?;
        return resolve(&constraint, WILDCARD_CHANNEL, platform, snapshot);
    }

    match resolve(&TagConstraint::Any, channel, platform, snapshot) {
        Ok(version) => Ok(version),
        Err(_) if !channel_explicit && channel != WILDCARD_CHANNEL => {
            resolve(&TagConstraint::Any, WILDCARD_CHANNEL, platform, snapshot)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::types::Asset;
    use chrono::Utc;
    use rstest::rstest;

    fn snapshot() -> Vec<Version> {
        ["0.9.0", "1.0.0", "1.1.0", "1.2.0-beta.1", "2.0.0-alpha.2"]
            .iter()
            .map(|tag| {
                Version::try_new(tag, Utc::now())
                    .unwrap()
                    .with_asset(Asset::new(&format!("app-{tag}.dmg"), "osx_64", 1))
            })
            .collect()
    }

    #[rstest]
    #[case(">=1.0.0", TagConstraint::Cmp(Op::Ge, semver::Version::parse("1.0.0").unwrap()))]
    #[case("<=2.0.0", TagConstraint::Cmp(Op::Le, semver::Version::parse("2.0.0").unwrap()))]
    #[case(">1.0.0", TagConstraint::Cmp(Op::Gt, semver::Version::parse("1.0.0").unwrap()))]
    #[case("<1.0.0", TagConstraint::Cmp(Op::Lt, semver::Version::parse("1.0.0").unwrap()))]
    #[case("=1.0.0", TagConstraint::Cmp(Op::Eq, semver::Version::parse("1.0.0").unwrap()))]
    #[case("1.0.0", TagConstraint::Cmp(Op::Eq, semver::Version::parse("1.0.0").unwrap()))]
    #[case("*", TagConstraint::Any)]
    #[case("latest", TagConstraint::Any)]
    #[case(">= 1.0.0", TagConstraint::Cmp(Op::Ge, semver::Version::parse("1.0.0").unwrap()))]
    fn tag_constraint_parses(#[case] input: &str, #[case] expected: TagConstraint) {
        assert_eq!(input.parse::<TagConstraint>().unwrap(), expected);
    }

    #[rstest]
    #[case(">=")]
    #[case("1.x")]
    #[case("~1.0.0")]
    fn tag_constraint_rejects_invalid_input(#[case] input: &str) {
        assert!(matches!(
            input.parse::<TagConstraint>(),
            Err(SelectError::InvalidConstraint(_))
        ));
    }

    #[test]
    fn filter_orders_strictly_descending() {
        let constraint = TagConstraint::at_least("1.0.0").unwrap();
        let result = filter(&constraint, "*", Some("osx_64"), &snapshot());

        let tags: Vec<&str> = result.iter().map(|v| v.tag.as_str()).collect();
        assert_eq!(tags, vec!["2.0.0-alpha.2", "1.2.0-beta.1", "1.1.0", "1.0.0"]);
    }

    #[test]
    fn filter_matches_exact_channel() {
        let result = filter(&TagConstraint::Any, "beta", None, &snapshot());
        let tags: Vec<&str> = result.iter().map(|v| v.tag.as_str()).collect();
        assert_eq!(tags, vec!["1.2.0-beta.1"]);
    }

    #[test]
    fn filter_excludes_versions_without_platform_assets() {
        let mut versions = snapshot();
        versions.push(Version::try_new("3.0.0", Utc::now()).unwrap());

        let result = filter(&TagConstraint::Any, "*", Some("osx_64"), &versions);
        assert!(result.iter().all(|v| v.tag != "3.0.0"));

        // Without a platform axis the assetless version is retained
        let result = filter(&TagConstraint::Any, "*", None, &versions);
        assert!(result.iter().any(|v| v.tag == "3.0.0"));
    }

    #[test]
    fn resolve_returns_head_or_not_found() {
        let resolved = resolve(&TagConstraint::Any, "stable", None, &snapshot()).unwrap();
        assert_eq!(resolved.tag, "1.1.0");

        assert!(matches!(
            resolve(&TagConstraint::Any, "nightly", None, &snapshot()),
            Err(SelectError::VersionNotFound)
        ));
    }

    #[test]
    fn fallback_retries_wildcard_for_implicit_channel() {
        let resolved =
            resolve_with_fallback(LATEST_TAG, "nightly", false, None, &snapshot()).unwrap();
        assert_eq!(resolved.tag, "2.0.0-alpha.2");
    }

    #[test]
    fn fallback_does_not_relax_explicit_channel() {
        assert!(matches!(
            resolve_with_fallback(LATEST_TAG, "nightly", true, None, &snapshot()),
            Err(SelectError::VersionNotFound)
        ));
    }

    #[test]
    fn fallback_never_relaxes_a_tag_pin() {
        let resolved = resolve_with_fallback("1.2.0-beta.1", "stable", true, None, &snapshot())
            .unwrap();
        assert_eq!(resolved.tag, "1.2.0-beta.1");

        assert!(matches!(
            resolve_with_fallback("9.9.9", "stable", false, None, &snapshot()),
            Err(SelectError::VersionNotFound)
        ));
    }
}
