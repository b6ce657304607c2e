//! # ADRELAY Host
//!
//! Frame loop and startup config for apps that run ad sessions.
//!
//! ```text
//! config/adrelay.toml ──> AppConfig ──> AdSession(s) ──┐
//!                                                      │ SDK callbacks
//! FrameLoop::frame() ──> Dispatcher::tick() <──────────┘
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod frame_loop;

pub use config::{AppConfig, HostConfig};
pub use error::{HostError, HostResult};
pub use frame_loop::{FrameLoop, FrameStats, FrameStatsAccumulator, PlayState, TARGET_FRAME_TIME};

/// Re-export of the dispatcher crate.
pub use adrelay_dispatch as dispatch;

/// Re-export of the ad session crate.
pub use adrelay_ads as ads;
