//! # Ad Error Types
//!
//! Configuration and usage errors of an ad session. SDK load/show failures
//! are not errors here: they arrive as [`AdEvent::Failed`](crate::AdEvent::Failed).

use thiserror::Error;

/// Errors that can occur when configuring or driving an ad session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdError {
    /// The configured ad kind is not one of reward video, banner or interstitial.
    #[error("unsupported ad kind: {0}")]
    UnsupportedAdKind(String),

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Two behaviour flags that must not be combined were both set.
    #[error("ad session `{name}`: {first} cannot be combined with {second}")]
    ConflictingFlags {
        /// Session name.
        name: String,
        /// First flag.
        first: &'static str,
        /// Second flag.
        second: &'static str,
    },

    /// `play` was called before any ad unit was created.
    #[error("ad session `{name}` has no ad unit, call load_ad first")]
    NotInitialized {
        /// Session name.
        name: String,
    },

    /// The SDK backend rejected a call.
    #[error("ad backend error: {0}")]
    Backend(String),
}

/// Result type for ad operations.
pub type AdResult<T> = Result<T, AdError>;
