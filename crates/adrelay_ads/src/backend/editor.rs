//! Placeholder backend for the editor and for tests.
//!
//! Never calls back on its own. Every call is recorded, and the most recent
//! listener is kept so tooling can fire SDK signals by hand through an
//! [`EditorProbe`], from any thread.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{AdBackend, SdkListener, SdkSignal};
use crate::error::{AdError, AdResult};
use crate::kind::AdKind;
use crate::request::{AdRequest, AdUnit};

/// A call the session made on the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    /// `load` with the unit and the registered test devices.
    Load {
        /// Unit kind.
        kind: AdKind,
        /// Resolved unit id.
        unit_id: String,
        /// Test devices on the request.
        test_devices: Vec<String>,
    },
    /// `show`.
    Show,
    /// `hide`.
    Hide,
    /// `release`.
    Release,
}

#[derive(Debug, Default)]
struct EditorUnit {
    listener: Option<SdkListener>,
    ready: bool,
}

#[derive(Debug, Default)]
struct Shared {
    calls: Mutex<Vec<BackendCall>>,
    unit: Mutex<EditorUnit>,
}

/// Editor placeholder SDK.
#[derive(Debug, Default)]
pub struct EditorBackend {
    shared: Arc<Shared>,
    has_unit: bool,
}

impl EditorBackend {
    /// Creates a backend with no unit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a probe sharing this backend's record.
    #[must_use]
    pub fn probe(&self) -> EditorProbe {
        EditorProbe {
            shared: Arc::clone(&self.shared),
        }
    }

    fn record(&self, call: BackendCall) {
        self.shared.calls.lock().push(call);
    }
}

impl AdBackend for EditorBackend {
    fn load(&mut self, unit: &AdUnit, request: &AdRequest, listener: SdkListener) -> AdResult<()> {
        self.record(BackendCall::Load {
            kind: unit.kind,
            unit_id: unit.unit_id.clone(),
            test_devices: request.test_devices().to_vec(),
        });
        *self.shared.unit.lock() = EditorUnit {
            listener: Some(listener),
            ready: false,
        };
        self.has_unit = true;
        Ok(())
    }

    fn show(&mut self) -> AdResult<()> {
        if !self.has_unit {
            return Err(AdError::Backend("editor: show without a unit".to_owned()));
        }
        self.record(BackendCall::Show);
        Ok(())
    }

    fn hide(&mut self) {
        self.record(BackendCall::Hide);
    }

    fn is_loaded(&self) -> bool {
        self.has_unit && self.shared.unit.lock().ready
    }

    fn release(&mut self) {
        self.record(BackendCall::Release);
        *self.shared.unit.lock() = EditorUnit::default();
        self.has_unit = false;
    }
}

/// Inspects an [`EditorBackend`] and fires signals on its behalf.
#[derive(Clone, Debug)]
pub struct EditorProbe {
    shared: Arc<Shared>,
}

impl EditorProbe {
    /// Calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.shared.calls.lock().clone()
    }

    /// Number of `load` calls recorded so far.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.shared
            .calls
            .lock()
            .iter()
            .filter(|call| matches!(call, BackendCall::Load { .. }))
            .count()
    }

    /// Marks the current unit ready (or not) without any signal.
    pub fn set_ready(&self, ready: bool) {
        self.shared.unit.lock().ready = ready;
    }

    /// Fires `signal` at the current unit's listener, as the SDK would.
    ///
    /// `Loaded` also marks the unit ready. Returns `false` when there is no
    /// unit to fire at.
    pub fn fire(&self, signal: SdkSignal) -> bool {
        let listener = {
            let mut unit = self.shared.unit.lock();
            if signal == SdkSignal::Loaded {
                unit.ready = unit.listener.is_some();
            }
            unit.listener.clone()
        };
        match listener {
            Some(listener) => {
                listener.notify(signal);
                true
            }
            None => false,
        }
    }
}
