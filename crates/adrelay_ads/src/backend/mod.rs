//! # SDK Backend Seam
//!
//! The third-party ad SDK lives behind [`AdBackend`]. A backend creates the
//! ad unit, loads and shows it, and reports what happens through the
//! [`SdkListener`] it was given, from whatever thread the SDK uses.
//!
//! ## Contract
//!
//! ```text
//! AdSession ──load/show/hide/release──> AdBackend
//!     ^                                     │
//!     │                              (SDK thread)
//!     └── Dispatcher <── SdkListener::notify(SdkSignal)
//! ```
//!
//! A backend must not call `notify` synchronously from inside one of its own
//! methods on the owner thread: the session holds the backend lock there.

mod editor;
mod simulated;

pub use editor::{BackendCall, EditorBackend, EditorProbe};
pub use simulated::{SimulatedBackend, SimulatedSdkConfig};

use std::fmt;
use std::sync::Arc;

use crate::error::AdResult;
use crate::request::{AdRequest, AdUnit};

/// Reward amount the editor grants on every `play`.
pub const EDITOR_REWARD_AMOUNT: f64 = 10.0;

/// Reward type the editor grants on every `play`.
pub const EDITOR_REWARD_KIND: &str = "Editor";

/// Reward reported by the SDK.
#[derive(Clone, Debug, PartialEq)]
pub struct Reward {
    /// Reward currency or type.
    pub kind: String,
    /// Amount granted.
    pub amount: f64,
}

impl Reward {
    /// The fixed reward granted in the editor.
    #[must_use]
    pub fn editor() -> Self {
        Self {
            kind: EDITOR_REWARD_KIND.to_owned(),
            amount: EDITOR_REWARD_AMOUNT,
        }
    }
}

/// Raw SDK callback, before the session interprets it.
#[derive(Clone, Debug, PartialEq)]
pub enum SdkSignal {
    /// The ad is opening.
    Opening,
    /// The ad finished loading.
    Loaded,
    /// Loading failed.
    FailedToLoad(String),
    /// Showing failed.
    FailedToShow(String),
    /// The user earned a reward.
    EarnedReward(Reward),
    /// The ad was closed.
    Closed,
    /// A click is taking the user out of the app.
    LeavingApplication,
}

impl SdkSignal {
    /// Label used for the dispatched task.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Opening => "sdk-opening",
            Self::Loaded => "sdk-loaded",
            Self::FailedToLoad(_) => "sdk-failed-to-load",
            Self::FailedToShow(_) => "sdk-failed-to-show",
            Self::EarnedReward(_) => "sdk-earned-reward",
            Self::Closed => "sdk-closed",
            Self::LeavingApplication => "sdk-leaving-application",
        }
    }
}

/// Handle SDK code calls to report a [`SdkSignal`]. Safe to clone and call
/// from any thread.
#[derive(Clone)]
pub struct SdkListener {
    route: Arc<dyn Fn(SdkSignal) + Send + Sync>,
}

impl SdkListener {
    /// Builds a listener around a routing function.
    pub fn new<F>(route: F) -> Self
    where
        F: Fn(SdkSignal) + Send + Sync + 'static,
    {
        Self {
            route: Arc::new(route),
        }
    }

    /// A listener that drops every signal.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(|signal| tracing::trace!(signal = signal.label(), "signal dropped by detached listener"))
    }

    /// Reports a signal.
    pub fn notify(&self, signal: SdkSignal) {
        (self.route)(signal);
    }
}

impl fmt::Debug for SdkListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkListener").finish_non_exhaustive()
    }
}

/// The third-party SDK, one ad unit at a time.
pub trait AdBackend: Send {
    /// Creates a fresh ad unit (replacing any previous one) and starts
    /// loading it. Completion is reported through `listener`.
    ///
    /// # Errors
    ///
    /// Returns [`AdError::Backend`](crate::AdError::Backend) when the SDK
    /// refuses to create the unit.
    fn load(&mut self, unit: &AdUnit, request: &AdRequest, listener: SdkListener) -> AdResult<()>;

    /// Shows the current unit. A unit that is not ready reports
    /// [`SdkSignal::FailedToShow`] rather than returning an error.
    ///
    /// # Errors
    ///
    /// Returns [`AdError::Backend`](crate::AdError::Backend) when there is no
    /// unit at all.
    fn show(&mut self) -> AdResult<()>;

    /// Hides the current banner.
    fn hide(&mut self);

    /// Whether the current unit is ready to show.
    fn is_loaded(&self) -> bool;

    /// Drops the current unit. Signals still in flight for it are discarded.
    fn release(&mut self);
}
