//! Ad unit kinds.

use std::fmt;
use std::str::FromStr;

use crate::error::AdError;

/// The kind of ad unit a session drives.
///
/// Older config files use the numeric codes 0, 1 and 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdKind {
    /// Full-screen video that grants a reward when watched.
    RewardedVideo = 0,
    /// Banner view anchored on screen.
    Banner = 1,
    /// Full-screen interstitial.
    Interstitial = 2,
}

impl AdKind {
    /// All supported kinds.
    pub const ALL: [AdKind; 3] = [Self::RewardedVideo, Self::Banner, Self::Interstitial];

    /// Canonical config name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RewardedVideo => "reward_video",
            Self::Banner => "banner",
            Self::Interstitial => "interstitial",
        }
    }

    /// Whether watching this kind to the end earns a reward.
    #[must_use]
    pub fn grants_reward(self) -> bool {
        matches!(self, Self::RewardedVideo)
    }

    /// Legacy numeric code.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdKind {
    type Err = AdError;

    /// Accepts the config names and the legacy type names, ignoring case,
    /// `_` and `-` (`reward_video`, `RewardVideoAd`, `banner-view`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "rewardvideo" | "rewardvideoad" | "rewardedvideo" | "rewarded" => Ok(Self::RewardedVideo),
            "banner" | "bannerview" => Ok(Self::Banner),
            "interstitial" | "interstitialad" => Ok(Self::Interstitial),
            _ => Err(AdError::UnsupportedAdKind(s.to_owned())),
        }
    }
}

impl TryFrom<i64> for AdKind {
    type Error = AdError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::RewardedVideo),
            1 => Ok(Self::Banner),
            2 => Ok(Self::Interstitial),
            other => Err(AdError::UnsupportedAdKind(other.to_string())),
        }
    }
}
