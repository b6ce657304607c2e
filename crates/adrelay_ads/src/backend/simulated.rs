//! # Simulated SDK
//!
//! Behaves like a network-backed SDK: every load and show completes later,
//! on a worker thread, with seeded-random latency and fill rate. Used by the
//! demo binary and by tests that need callbacks to arrive off the main
//! thread.
//!
//! ## Signal Sequences
//!
//! ```text
//! load:  (latency) ─> Loaded | FailedToLoad("no fill")
//! show:  not ready ─> FailedToShow("ad not ready")
//!        rewarded     ─> Opening ─ (latency) ─> EarnedReward ─> Closed
//!        interstitial ─> Opening ─ (latency) ─> Closed
//!        banner       ─> Opening
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use super::{AdBackend, Reward, SdkListener, SdkSignal};
use crate::error::{AdError, AdResult};
use crate::kind::AdKind;
use crate::request::{AdRequest, AdUnit};

/// Tuning for [`SimulatedBackend`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatedSdkConfig {
    /// Shortest load latency.
    pub min_latency_ms: u64,
    /// Longest load latency.
    pub max_latency_ms: u64,
    /// Probability in `[0, 1]` that a load fails with "no fill".
    pub failure_rate: f64,
    /// How long a full-screen ad stays open before it closes.
    pub watch_ms: u64,
    /// Reward granted by rewarded videos.
    pub reward_amount: f64,
    /// Reward type granted by rewarded videos.
    pub reward_kind: String,
    /// RNG seed.
    pub seed: u64,
}

impl Default for SimulatedSdkConfig {
    fn default() -> Self {
        Self {
            min_latency_ms: 20,
            max_latency_ms: 120,
            failure_rate: 0.1,
            watch_ms: 50,
            reward_amount: 10.0,
            reward_kind: "coins".to_owned(),
            seed: 0x00AD_5EED,
        }
    }
}

struct Unit {
    kind: AdKind,
    listener: SdkListener,
}

/// Unit lifecycle shared with worker threads. Workers check it and update
/// `ready` under the lock, so a `load` or `release` never interleaves with
/// a worker's check. Signals are sent after the lock is dropped: the owner
/// thread may call into the backend while holding the dispatcher lock.
#[derive(Debug, Default)]
struct Gate {
    /// Bumped on every load and release; stale load workers stay silent.
    epoch: u64,
    /// Bumped on release only. A reload must not cut off a showing ad.
    releases: u64,
    ready: bool,
}

/// Thread-backed fake SDK.
pub struct SimulatedBackend {
    config: SimulatedSdkConfig,
    rng: StdRng,
    unit: Option<Unit>,
    gate: Arc<Mutex<Gate>>,
}

impl SimulatedBackend {
    /// Creates a backend.
    #[must_use]
    pub fn new(config: SimulatedSdkConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            unit: None,
            gate: Arc::new(Mutex::new(Gate::default())),
        }
    }

    fn latency(&mut self) -> Duration {
        let min = self.config.min_latency_ms;
        let max = self.config.max_latency_ms.max(min);
        Duration::from_millis(self.rng.gen_range(min..=max))
    }

    fn spawn_sequence(&self, listener: SdkListener, steps: Vec<(Duration, SdkSignal)>) {
        let gate = Arc::clone(&self.gate);
        let born = gate.lock().releases;
        thread::spawn(move || {
            for (delay, signal) in steps {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                if gate.lock().releases != born {
                    tracing::trace!(signal = signal.label(), "simulated unit released, signal dropped");
                    return;
                }
                listener.notify(signal);
            }
        });
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(SimulatedSdkConfig::default())
    }
}

impl AdBackend for SimulatedBackend {
    fn load(&mut self, unit: &AdUnit, request: &AdRequest, listener: SdkListener) -> AdResult<()> {
        let born = {
            let mut gate = self.gate.lock();
            gate.epoch += 1;
            gate.ready = false;
            gate.epoch
        };

        let delay = self.latency();
        let fails = self.rng.gen_bool(self.config.failure_rate.clamp(0.0, 1.0));
        tracing::debug!(
            kind = %unit.kind,
            unit_id = %unit.unit_id,
            test = request.is_test(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            fails,
            "simulated load"
        );

        let gate = Arc::clone(&self.gate);
        let worker_listener = listener.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            {
                let mut gate = gate.lock();
                if gate.epoch != born {
                    return;
                }
                gate.ready = !fails;
            }
            if fails {
                worker_listener.notify(SdkSignal::FailedToLoad("no fill".to_owned()));
            } else {
                worker_listener.notify(SdkSignal::Loaded);
            }
        });

        self.unit = Some(Unit {
            kind: unit.kind,
            listener,
        });
        Ok(())
    }

    fn show(&mut self) -> AdResult<()> {
        let Some(unit) = &self.unit else {
            return Err(AdError::Backend("simulated: show without a unit".to_owned()));
        };
        let listener = unit.listener.clone();
        let kind = unit.kind;

        let was_ready = {
            let mut gate = self.gate.lock();
            let was_ready = gate.ready;
            if kind != AdKind::Banner {
                gate.ready = false;
            }
            was_ready
        };
        if !was_ready {
            self.spawn_sequence(
                listener,
                vec![(Duration::ZERO, SdkSignal::FailedToShow("ad not ready".to_owned()))],
            );
            return Ok(());
        }

        let watch = Duration::from_millis(self.config.watch_ms);
        let steps = match kind {
            AdKind::RewardedVideo => {
                let reward = Reward {
                    kind: self.config.reward_kind.clone(),
                    amount: self.config.reward_amount,
                };
                vec![
                    (Duration::ZERO, SdkSignal::Opening),
                    (watch, SdkSignal::EarnedReward(reward)),
                    (Duration::ZERO, SdkSignal::Closed),
                ]
            }
            AdKind::Interstitial => vec![(Duration::ZERO, SdkSignal::Opening), (watch, SdkSignal::Closed)],
            AdKind::Banner => vec![(Duration::ZERO, SdkSignal::Opening)],
        };
        self.spawn_sequence(listener, steps);
        Ok(())
    }

    fn hide(&mut self) {
        tracing::trace!("simulated banner hidden");
    }

    fn is_loaded(&self) -> bool {
        self.unit.is_some() && self.gate.lock().ready
    }

    fn release(&mut self) {
        {
            let mut gate = self.gate.lock();
            gate.epoch += 1;
            gate.releases += 1;
            gate.ready = false;
        }
        self.unit = None;
    }
}
