//! Release channels and channel derivation from version tags

/// Channel name matching any release track
pub const WILDCARD_CHANNEL: &str = "*";

/// Channel name for versions without a prerelease tag
pub const STABLE_CHANNEL: &str = "stable";

/// Multiplier separating the channel rank from the prerelease counter in the
/// numeric windows encoding
pub const CHANNEL_MAGNITUDE: u64 = 1000;

/// Ranked prerelease channel
///
/// The order of [`Channel::RANKED`] is the single source of truth for both
/// filtering precedence and the numeric version encoding: rank 1 is `alpha`,
/// rank 4 is `rc`. Versions without a prerelease belong to the unranked
/// `stable` track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Alpha,
    Beta,
    Unstable,
    Rc,
}

impl Channel {
    /// Ordered list of supported channels, lowest rank first
    pub const RANKED: [Channel; 4] = [
        Channel::Alpha,
        Channel::Beta,
        Channel::Unstable,
        Channel::Rc,
    ];

    /// Returns the 1-based rank used by the numeric version encoding
    pub fn rank(self) -> u64 {
        match self {
            Channel::Alpha => 1,
            Channel::Beta => 2,
            Channel::Unstable => 3,
            Channel::Rc => 4,
        }
    }

    /// Returns the channel for a 1-based rank
    pub fn from_rank(rank: u64) -> Option<Channel> {
        match rank {
            1 => Some(Channel::Alpha),
            2 => Some(Channel::Beta),
            3 => Some(Channel::Unstable),
            4 => Some(Channel::Rc),
            _ => None,
        }
    }

    /// Returns the string representation of the channel
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Alpha => "alpha",
            Channel::Beta => "beta",
            Channel::Unstable => "unstable",
            Channel::Rc => "rc",
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alpha" => Ok(Channel::Alpha),
            "beta" => Ok(Channel::Beta),
            "unstable" => Ok(Channel::Unstable),
            "rc" => Ok(Channel::Rc),
            _ => Err(()),
        }
    }
}

/// Derive the channel name for a parsed version tag
///
/// The first prerelease identifier names the channel; a version without a
/// prerelease is on the `stable` track. Unknown prerelease identifiers still
/// name a track here (e.g. `1.0.0-nightly.1` is on `nightly`) so that
/// filtering by channel works for them, even though the numeric codec does
/// not support them.
pub fn channel_of(version: &semver::Version) -> String {
    if version.pre.is_empty() {
        return STABLE_CHANNEL.to_string();
    }

    version
        .pre
        .as_str()
        .split('.')
        .next()
        .unwrap_or(STABLE_CHANNEL)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Channel::Alpha, 1)]
    #[case(Channel::Beta, 2)]
    #[case(Channel::Unstable, 3)]
    #[case(Channel::Rc, 4)]
    fn rank_round_trips(#[case] channel: Channel, #[case] rank: u64) {
        assert_eq!(channel.rank(), rank);
        assert_eq!(Channel::from_rank(rank), Some(channel));
        assert_eq!(channel.as_str().parse::<Channel>(), Ok(channel));
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    #[case(u64::MAX)]
    fn from_rank_rejects_out_of_range(#[case] rank: u64) {
        assert_eq!(Channel::from_rank(rank), None);
    }

    #[rstest]
    #[case("1.0.0", "stable")]
    #[case("1.0.0-beta.3", "beta")]
    #[case("2.1.0-alpha", "alpha")]
    #[case("1.0.0-nightly.1", "nightly")]
    fn channel_of_uses_first_prerelease_identifier(#[case] tag: &str, #[case] expected: &str) {
        let version = semver::Version::parse(tag).unwrap();
        assert_eq!(channel_of(&version), expected);
    }
}
