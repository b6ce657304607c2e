//! # Ad Session Configuration
//!
//! Loaded once at startup from TOML.
//!
//! ```toml
//! name = "shop_reward"
//! kind = "reward_video"          # or "banner", "interstitial", or 0 / 1 / 2
//!
//! [behaviour]
//! init_on_enable = true
//! request_new_after_play = true
//!
//! [debug]
//! is_real_ads = false
//! is_test = true
//!
//! [ids]
//! play_market_id = "<android ad unit>"
//! app_store_id = "<ios ad unit>"
//! test_unit_ids = { android = "<android test unit>", ios = "<ios test unit>" }
//!
//! [banner]
//! size = "smart_banner"
//! position = "bottom"
//! ```
//!
//! Parsing goes through [`RawAdConfig`] so that an unknown `kind` surfaces
//! as [`AdError::UnsupportedAdKind`] instead of a generic parse error.

use serde::Deserialize;

use crate::banner::BannerLayout;
use crate::error::{AdError, AdResult};
use crate::kind::AdKind;

/// Behaviour flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Behaviour {
    /// Load an ad when the session is enabled.
    pub init_on_enable: bool,
    /// Load again after a load or show failure. Pair with a connectivity
    /// check, or avoid combining with `init_on_enable`.
    pub init_on_failed: bool,
    /// Release the ad unit when the session is disabled.
    pub unload_on_disable: bool,
    /// Load the next ad right after `play`.
    pub request_new_after_play: bool,
    /// Show the ad as soon as it has loaded.
    pub play_after_load: bool,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            init_on_enable: false,
            init_on_failed: false,
            unload_on_disable: true,
            request_new_after_play: true,
            play_after_load: false,
        }
    }
}

/// Test-mode switches. Overridden for store installs, see
/// [`AdSession::on_enable`](crate::AdSession::on_enable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DebugFlags {
    /// Use the real store ad unit ids instead of test ids.
    pub is_real_ads: bool,
    /// Register this device as a test device on every request.
    pub is_test: bool,
}

impl Default for DebugFlags {
    fn default() -> Self {
        Self {
            is_real_ads: false,
            is_test: true,
        }
    }
}

/// Test ad unit ids per platform. Never hard-coded, always configured.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestUnitIds {
    /// Android test unit.
    pub android: Option<String>,
    /// iOS test unit.
    pub ios: Option<String>,
}

/// Ad unit ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdUnitIds {
    /// Real unit id for Android (Play Market).
    pub play_market_id: String,
    /// Real unit id for iOS (App Store).
    pub app_store_id: String,
    /// Units used while `is_real_ads` is off.
    pub test_unit_ids: TestUnitIds,
}

/// `kind` as written in TOML: a name or a legacy numeric code.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KindSetting {
    /// `kind = "banner"`.
    Name(String),
    /// `kind = 1`.
    Code(i64),
}

/// An ad session config exactly as deserialized, before the kind is checked.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RawAdConfig {
    /// Session name, used in log lines.
    pub name: String,
    /// Unchecked ad kind.
    pub kind: KindSetting,
    /// Behaviour flags.
    #[serde(default)]
    pub behaviour: Behaviour,
    /// Test-mode switches.
    #[serde(default)]
    pub debug: DebugFlags,
    /// Unit ids.
    #[serde(default)]
    pub ids: AdUnitIds,
    /// Banner layout.
    #[serde(default)]
    pub banner: BannerLayout,
}

/// A validated ad session config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdConfig {
    /// Session name, used in log lines.
    pub name: String,
    /// Ad kind.
    pub kind: AdKind,
    /// Behaviour flags.
    pub behaviour: Behaviour,
    /// Test-mode switches.
    pub debug: DebugFlags,
    /// Unit ids.
    pub ids: AdUnitIds,
    /// Banner layout.
    pub banner: BannerLayout,
}

impl AdConfig {
    /// Config with default flags.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: AdKind) -> Self {
        Self {
            name: name.into(),
            kind,
            behaviour: Behaviour::default(),
            debug: DebugFlags::default(),
            ids: AdUnitIds::default(),
            banner: BannerLayout::default(),
        }
    }

    /// Parses and validates a single session from TOML.
    ///
    /// # Errors
    ///
    /// [`AdError::Config`] on malformed TOML, [`AdError::UnsupportedAdKind`]
    /// on an unknown kind, [`AdError::ConflictingFlags`] on contradictory
    /// behaviour flags.
    pub fn from_toml_str(source: &str) -> AdResult<Self> {
        let raw: RawAdConfig = toml::from_str(source).map_err(|e| AdError::Config(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Rejects flag combinations that can never behave sensibly.
    ///
    /// # Errors
    ///
    /// `play_after_load` with `request_new_after_play` loops forever:
    /// every play loads, every load plays.
    pub fn validate(&self) -> AdResult<()> {
        if self.behaviour.play_after_load && self.behaviour.request_new_after_play {
            return Err(AdError::ConflictingFlags {
                name: self.name.clone(),
                first: "play_after_load",
                second: "request_new_after_play",
            });
        }
        Ok(())
    }
}

impl TryFrom<RawAdConfig> for AdConfig {
    type Error = AdError;

    fn try_from(raw: RawAdConfig) -> Result<Self, Self::Error> {
        let kind = match raw.kind {
            KindSetting::Name(name) => name.parse::<AdKind>()?,
            KindSetting::Code(code) => AdKind::try_from(code)?,
        };
        let config = Self {
            name: raw.name,
            kind,
            behaviour: raw.behaviour,
            debug: raw.debug,
            ids: raw.ids,
            banner: raw.banner,
        };
        config.validate()?;
        Ok(config)
    }
}
