//! # ADRELAY Ads
//!
//! Rewarded video, banner and interstitial ad sessions for a frame-driven
//! app. The ad SDK calls back from its own threads; every callback is
//! re-posted through an [`adrelay_dispatch::Dispatcher`] so application
//! code only ever sees [`AdEvent`]s on the main thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   load/show    ┌──────────────┐
//! │  AdSession   │ ─────────────> │  AdBackend   │  (SDK, editor, simulated)
//! │  (AdConfig,  │                └──────┬───────┘
//! │ Environment) │                       │ SdkSignal (any thread)
//! └──────┬───────┘                       v
//!        │ AdEvent            ┌──────────────────┐
//!        v                    │    Dispatcher    │ ── tick() once per frame
//! ┌──────────────┐  <──────── └──────────────────┘
//! │  EventSink   │   handle_signal on owner thread
//! └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use adrelay_ads::{AdConfig, AdEvent, AdKind, AdSession, EditorBackend, Environment};
//! use adrelay_dispatch::Dispatcher;
//!
//! let dispatcher = Dispatcher::new();
//! let session = AdSession::new(
//!     AdConfig::new("shop_reward", AdKind::RewardedVideo),
//!     Environment::editor(true),
//!     EditorBackend::new(),
//!     dispatcher.clone(),
//! )?;
//!
//! session.on_event(|event| {
//!     if let AdEvent::Watched(amount) = event {
//!         println!("reward: {amount}");
//!     }
//! });
//! session.load_ad()?;
//! session.play()?;
//! assert_eq!(session.amount(), 10.0);
//! # Ok::<(), adrelay_ads::AdError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod banner;
pub mod config;
pub mod environment;
pub mod error;
pub mod event;
pub mod kind;
pub mod request;
pub mod session;

pub use backend::{
    AdBackend, BackendCall, EditorBackend, EditorProbe, Reward, SdkListener, SdkSignal, SimulatedBackend,
    SimulatedSdkConfig,
};
pub use banner::{AdPosition, AdSize, BannerLayout};
pub use config::{AdConfig, AdUnitIds, Behaviour, DebugFlags, RawAdConfig, TestUnitIds};
pub use environment::{Environment, InstallMode, Platform};
pub use error::{AdError, AdResult};
pub use event::{AdEvent, ChannelSink, EventSink};
pub use kind::AdKind;
pub use request::{AdRequest, AdUnit};
pub use session::AdSession;
