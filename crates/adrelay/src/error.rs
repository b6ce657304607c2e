//! Host error types.

use std::path::PathBuf;

use adrelay_ads::AdError;
use thiserror::Error;

/// Errors raised while starting the host.
#[derive(Error, Debug)]
pub enum HostError {
    /// The config file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for an app config.
    #[error("invalid app config: {0}")]
    Toml(#[from] toml::de::Error),

    /// An `[[ads]]` entry was rejected.
    #[error(transparent)]
    Ad(#[from] AdError),

    /// Host settings are out of range.
    #[error("invalid host setting: {0}")]
    InvalidSetting(String),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
