use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid semantic version: {0}")]
    InvalidSemver(#[from] semver::Error),

    #[error("Invalid windows version: {0}")]
    InvalidWindowsVersion(String),

    #[error("Prerelease not supported by the numeric encoding: {0}")]
    UnsupportedPrerelease(String),

    #[error("Numeric field {0} maps to no known channel")]
    UnsupportedChannelField(u64),
}

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("Invalid tag constraint: {0}")]
    InvalidConstraint(String),

    #[error("No version matching the requested constraint")]
    VersionNotFound,
}
