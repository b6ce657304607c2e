//! # App Configuration
//!
//! One TOML file describes the host and every ad session:
//!
//! ```toml
//! [host]
//! target_fps = 60
//! max_frames = 600
//! log_slow_frames = true
//!
//! [simulated]
//! failure_rate = 0.2
//!
//! [[ads]]
//! name = "shop_reward"
//! kind = "reward_video"
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use adrelay_ads::{AdConfig, RawAdConfig, SimulatedSdkConfig};
use serde::Deserialize;

use crate::error::{HostError, HostResult};

/// Frame loop settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Frames per second the loop paces itself to.
    pub target_fps: u32,
    /// Stop after this many frames. `0` runs until stopped.
    pub max_frames: u64,
    /// Warn when a frame's dispatcher work exceeds the frame budget.
    pub log_slow_frames: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_frames: 0,
            log_slow_frames: false,
        }
    }
}

impl HostConfig {
    /// Time available to one frame.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAppConfig {
    host: HostConfig,
    simulated: SimulatedSdkConfig,
    ads: Vec<RawAdConfig>,
}

/// Everything the host needs at startup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppConfig {
    /// Frame loop settings.
    pub host: HostConfig,
    /// Tuning for the simulated SDK.
    pub simulated: SimulatedSdkConfig,
    /// Ad sessions, in file order.
    pub ads: Vec<AdConfig>,
}

impl AppConfig {
    /// Parses and validates an app config.
    ///
    /// # Errors
    ///
    /// [`HostError::Toml`] on malformed input, [`HostError::Ad`] for a
    /// rejected session, [`HostError::InvalidSetting`] for bad host values.
    pub fn from_toml_str(source: &str) -> HostResult<Self> {
        let raw: RawAppConfig = toml::from_str(source)?;
        if raw.host.target_fps == 0 {
            return Err(HostError::InvalidSetting("target_fps must be at least 1".to_owned()));
        }

        let ads = raw
            .ads
            .into_iter()
            .map(AdConfig::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        {
            let mut seen = HashSet::new();
            if let Some(dup) = ads.iter().find(|ad| !seen.insert(ad.name.as_str())) {
                return Err(HostError::InvalidSetting(format!("duplicate ad session name `{}`", dup.name)));
            }
        }

        Ok(Self {
            host: raw.host,
            simulated: raw.simulated,
            ads,
        })
    }

    /// Reads and parses an app config file.
    ///
    /// # Errors
    ///
    /// [`HostError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> HostResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), sessions = config.ads.len(), "app config loaded");
        Ok(config)
    }
}
