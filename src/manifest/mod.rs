//! Parser and generator for the windows `RELEASES` manifest
//!
//! The manifest is a plain-text index of packaged release files, one
//! `<sha1> <filename> <size>` row per line. Upstream packaging tools may
//! emit byte-order marks, mixed line terminators, blank lines or comments,
//! so parsing is deliberately lenient: lines that do not match the row
//! grammar are dropped without error.

use regex::Regex;
use tracing::debug;

use crate::version::codec;

/// One row of a `RELEASES` manifest
///
/// Transient: entries are rebuilt from manifest bytes on every check and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    /// SHA1 of the package file, 40 hex characters
    pub sha: String,
    /// Package filename; `None` until generated or rewritten
    pub filename: Option<String>,
    /// Package size in bytes
    pub size: u64,
    /// Whether this is an incremental (delta) package
    pub is_delta: bool,
    /// Dotted numeric windows version embedded in the filename
    pub version: String,
    /// Semantic version decoded from `version`
    pub semver: String,
    /// Application name used when synthesizing a filename
    pub app: Option<String>,
}

/// Suffix marking a complete (non-delta) package
const FULL_PACKAGE_MARKER: &str = "-full.nupkg";

/// Parser/generator for `RELEASES` manifests
pub struct ReleasesManifest {
    row_re: Regex,
}

impl ReleasesManifest {
    pub fn new() -> Self {
        Self {
            row_re: Regex::new(r"^([0-9a-fA-F]{40})\s+(\S+)\s+(\d+)\r*$").unwrap(),
        }
    }

    /// Parse manifest text into release entries
    ///
    /// Total over arbitrary input: unparseable lines are skipped, so the
    /// result may be empty but parsing itself never fails.
    pub fn parse(&self, content: &str) -> Vec<ReleaseEntry> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        content
            .replace("\r\n", "\n")
            .split('\n')
            .filter_map(|line| self.parse_row(line))
            .collect()
    }

    fn parse_row(&self, line: &str) -> Option<ReleaseEntry> {
        let captures = self.row_re.captures(line)?;

        let sha = captures[1].to_string();
        let filename = captures[2].to_string();
        let size = captures[3].parse::<u64>().ok()?;

        let is_delta = !filename.contains(FULL_PACKAGE_MARKER);
        let version = embedded_version(&filename);
        let semver = match codec::decode(&version) {
            Ok(semver) => semver,
            Err(err) => {
                debug!("Skipping manifest row without a usable version ({err}): {filename}");
                return None;
            }
        };

        Some(ReleaseEntry {
            sha,
            filename: Some(filename),
            size,
            is_delta,
            version,
            semver,
            app: None,
        })
    }

    /// Serialize entries back into manifest text, preserving caller order
    ///
    /// An entry without a filename gets one synthesized as
    /// `<app>-<version>-<full|delta>.nupkg`.
    pub fn generate(&self, entries: &[ReleaseEntry]) -> String {
        entries
            .iter()
            .map(|entry| {
                let filename = entry.filename.clone().unwrap_or_else(|| {
                    format!(
                        "{}-{}-{}.nupkg",
                        entry.app.as_deref().unwrap_or_default(),
                        entry.version,
                        if entry.is_delta { "delta" } else { "full" },
                    )
                });
                format!("{} {} {}", entry.sha, filename, entry.size)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ReleasesManifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Recover the dotted numeric version embedded in a package filename
///
/// Strips the `.nupkg` extension, splits the remainder on `.` and `-`, and
/// rejoins the purely numeric tokens in their original relative order, which
/// reconstructs `major.minor.patch[.field4]` regardless of the surrounding
/// name and delta/full suffix tokens.
fn embedded_version(filename: &str) -> String {
    let name = filename.strip_suffix(".nupkg").unwrap_or(filename);

    name.split(['.', '-'])
        .filter(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(".")
}
