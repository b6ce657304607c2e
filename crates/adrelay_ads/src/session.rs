//! # Ad Session
//!
//! One configured ad placement. Owns the backend, tracks load state, and
//! turns raw SDK signals into [`AdEvent`]s.
//!
//! ## Threading
//!
//! ```text
//! owner thread:  on_enable / load_ad / play / banner_hide / on_disable
//! SDK thread:    SdkListener::notify ──enqueue──> Dispatcher
//! owner thread:  Dispatcher::tick ──> handle_signal ──> EventSink::deliver
//! ```
//!
//! State transitions and event delivery therefore always happen on the
//! dispatcher's owner thread. Queued signal tasks hold only a weak reference,
//! so dropping the last session handle silences them.
//!
//! ## Lifecycle
//!
//! ```text
//! on_enable ─(init_on_enable)─> load_ad ─> [loading] ─Loaded─> [ready]
//!                                  ^                              │ play
//!                                  ├──── init_on_failed ── Failed │
//!                                  └──── request_new_after_play ──┘
//! ```

use std::sync::{Arc, Weak};

use adrelay_dispatch::{Dispatcher, Task};
use parking_lot::Mutex;

use crate::backend::{AdBackend, Reward, SdkListener, SdkSignal};
use crate::config::AdConfig;
use crate::environment::{Environment, InstallMode, Platform};
use crate::error::{AdError, AdResult};
use crate::event::{AdEvent, EventSink};
use crate::kind::AdKind;
use crate::request::{AdRequest, AdUnit, TEST_DEVICE_SIMULATOR};

#[derive(Debug)]
struct SessionState {
    initialized: bool,
    loading: bool,
    amount: f64,
    unit_id: String,
    is_real_ads: bool,
    is_test: bool,
    test_device: Option<String>,
}

struct SessionShared {
    config: AdConfig,
    environment: Environment,
    dispatcher: Dispatcher,
    backend: Mutex<Box<dyn AdBackend>>,
    state: Mutex<SessionState>,
    sinks: Mutex<Vec<Arc<dyn EventSink>>>,
}

/// Handle to an ad session. Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct AdSession {
    shared: Arc<SessionShared>,
}

impl AdSession {
    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns the [`AdConfig::validate`] error for contradictory flags.
    pub fn new<B>(config: AdConfig, environment: Environment, backend: B, dispatcher: Dispatcher) -> AdResult<Self>
    where
        B: AdBackend + 'static,
    {
        config.validate()?;
        let state = SessionState {
            initialized: false,
            loading: false,
            amount: 0.0,
            unit_id: String::new(),
            is_real_ads: config.debug.is_real_ads,
            is_test: config.debug.is_test,
            test_device: None,
        };
        Ok(Self {
            shared: Arc::new(SessionShared {
                config,
                environment,
                dispatcher,
                backend: Mutex::new(Box::new(backend)),
                state: Mutex::new(state),
                sinks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Registers a sink for this session's events.
    pub fn subscribe<S>(&self, sink: S)
    where
        S: EventSink + 'static,
    {
        self.shared.sinks.lock().push(Arc::new(sink));
    }

    /// Registers a closure for this session's events.
    pub fn on_event<F>(&self, f: F)
    where
        F: Fn(&AdEvent) + Send + Sync + 'static,
    {
        self.subscribe(f);
    }

    /// Session name from the config.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Ad kind from the config.
    #[must_use]
    pub fn kind(&self) -> AdKind {
        self.shared.config.kind
    }

    /// The session's config.
    #[must_use]
    pub fn config(&self) -> &AdConfig {
        &self.shared.config
    }

    /// The environment the session was created for.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.shared.environment
    }

    /// Whether an ad unit exists.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.shared.state.lock().initialized
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().loading
    }

    /// Whether the ad is ready to `play`. Banners are ready as soon as they
    /// exist.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        if !self.is_initialized() {
            return false;
        }
        match self.kind() {
            AdKind::Banner => true,
            AdKind::RewardedVideo | AdKind::Interstitial => self.shared.backend.lock().is_loaded(),
        }
    }

    /// Last reward amount. Reset to zero on failure or when the user leaves
    /// the app through the ad.
    #[must_use]
    pub fn amount(&self) -> f64 {
        self.shared.state.lock().amount
    }

    /// Unit id used by the most recent load.
    #[must_use]
    pub fn unit_id(&self) -> String {
        self.shared.state.lock().unit_id.clone()
    }

    /// Whether requests register test devices.
    #[must_use]
    pub fn is_test(&self) -> bool {
        self.shared.state.lock().is_test
    }

    /// Whether real store unit ids are used.
    #[must_use]
    pub fn is_real_ads(&self) -> bool {
        self.shared.state.lock().is_real_ads
    }

    /// Applies environment overrides and loads if `init_on_enable` is set.
    ///
    /// Does nothing in the editor outside play mode. Debug builds on a device
    /// force test mode; store installs force real ads with test mode off.
    ///
    /// # Errors
    ///
    /// Propagates a backend error from the initial load.
    pub fn on_enable(&self) -> AdResult<()> {
        let env = &self.shared.environment;
        if env.is_editor() && !env.playing {
            return Ok(());
        }

        {
            let mut state = self.shared.state.lock();
            if !env.is_editor() && env.debug_build {
                state.is_test = true;
            }
            if env.install_mode == InstallMode::Store {
                state.is_real_ads = true;
                state.is_test = false;
            }
            if state.is_test && state.test_device.is_none() {
                state.test_device.clone_from(&env.device_id);
            }
        }

        if self.shared.config.behaviour.init_on_enable {
            self.load_ad()?;
        }
        Ok(())
    }

    /// Releases the ad unit if `unload_on_disable` is set.
    pub fn on_disable(&self) {
        if !self.shared.config.behaviour.unload_on_disable {
            return;
        }
        if self.shared.environment.playing {
            tracing::info!(session = %self.name(), "ad session disabled, ad unloaded");
        }
        self.shared.backend.lock().release();

        let mut state = self.shared.state.lock();
        state.initialized = false;
        state.loading = false;
    }

    /// Creates a fresh ad unit and starts loading it.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if it refuses to create the unit; the
    /// session is then left uninitialized.
    pub fn load_ad(&self) -> AdResult<()> {
        let (unit, request) = {
            let mut state = self.shared.state.lock();
            state.loading = true;
            state.initialized = true;
            state.unit_id = self.resolve_unit_id(state.is_real_ads);
            let unit = AdUnit {
                kind: self.kind(),
                unit_id: state.unit_id.clone(),
                banner: (self.kind() == AdKind::Banner).then_some(self.shared.config.banner),
            };
            (unit, Self::build_request(&state))
        };

        tracing::debug!(
            session = %self.name(),
            kind = %unit.kind,
            unit_id = %unit.unit_id,
            test = request.is_test(),
            "loading ad"
        );
        let result = self.shared.backend.lock().load(&unit, &request, self.listener());
        if let Err(err) = &result {
            tracing::warn!(session = %self.name(), %err, "backend refused load");
            let mut state = self.shared.state.lock();
            state.loading = false;
            state.initialized = false;
        }
        result
    }

    /// Shows the ad. Check [`is_loaded`](Self::is_loaded) first.
    ///
    /// Loads the next ad right away if `request_new_after_play` is set. In
    /// the editor the fixed editor reward is granted immediately.
    ///
    /// # Errors
    ///
    /// [`AdError::NotInitialized`] before the first `load_ad`, or a backend
    /// error.
    pub fn play(&self) -> AdResult<()> {
        if !self.is_initialized() {
            return Err(AdError::NotInitialized {
                name: self.name().to_owned(),
            });
        }
        self.shared.backend.lock().show()?;

        if self.shared.config.behaviour.request_new_after_play {
            self.load_ad()?;
        }
        if self.shared.environment.is_editor() {
            self.handle_signal(SdkSignal::EarnedReward(Reward::editor()));
        }
        Ok(())
    }

    /// Hides the banner. No-op for other kinds.
    pub fn banner_hide(&self) {
        if self.kind() == AdKind::Banner {
            self.shared.backend.lock().hide();
        }
    }

    fn resolve_unit_id(&self, is_real_ads: bool) -> String {
        let ids = &self.shared.config.ids;
        match self.shared.environment.platform {
            Platform::Editor | Platform::Other => String::new(),
            Platform::Android if is_real_ads => ids.play_market_id.clone(),
            Platform::Android => ids.test_unit_ids.android.clone().unwrap_or_default(),
            Platform::Ios if is_real_ads => ids.app_store_id.clone(),
            Platform::Ios => ids.test_unit_ids.ios.clone().unwrap_or_default(),
        }
    }

    fn build_request(state: &SessionState) -> AdRequest {
        let mut builder = AdRequest::builder();
        if state.is_test {
            builder = builder.test_device(TEST_DEVICE_SIMULATOR);
            if let Some(device) = &state.test_device {
                builder = builder.test_device(device.clone());
            }
        }
        builder.build()
    }

    /// Listener that routes every signal through the dispatcher.
    fn listener(&self) -> SdkListener {
        let session: Weak<SessionShared> = Arc::downgrade(&self.shared);
        let dispatcher = self.shared.dispatcher.clone();
        SdkListener::new(move |signal| {
            let session = Weak::clone(&session);
            let label = signal.label();
            dispatcher.enqueue_task(
                Task::new(move || {
                    if let Some(shared) = session.upgrade() {
                        AdSession { shared }.handle_signal(signal);
                    }
                })
                .labeled(label),
            );
        })
    }

    fn handle_signal(&self, signal: SdkSignal) {
        // Queued before on_disable released the unit.
        if !self.is_initialized() {
            tracing::trace!(session = %self.name(), ?signal, "signal for released unit dropped");
            return;
        }
        let behaviour = self.shared.config.behaviour;
        match signal {
            SdkSignal::Opening => {
                tracing::trace!(session = %self.name(), "ad opening");
            }
            SdkSignal::Loaded => {
                self.shared.state.lock().loading = false;
                self.emit(&AdEvent::Loaded);
                if behaviour.play_after_load {
                    if let Err(err) = self.play() {
                        tracing::warn!(session = %self.name(), %err, "play after load failed");
                    }
                }
            }
            SdkSignal::FailedToLoad(message) | SdkSignal::FailedToShow(message) => {
                tracing::info!(session = %self.name(), %message, "ad failed");
                {
                    let mut state = self.shared.state.lock();
                    state.loading = false;
                    state.amount = 0.0;
                }
                self.emit(&AdEvent::Failed(message));
                if behaviour.init_on_failed {
                    if let Err(err) = self.load_ad() {
                        tracing::warn!(session = %self.name(), %err, "reload after failure refused");
                    }
                }
            }
            SdkSignal::EarnedReward(reward) => {
                tracing::info!(session = %self.name(), kind = %reward.kind, amount = reward.amount, "ad watched");
                self.shared.state.lock().amount = reward.amount;
                self.emit(&AdEvent::Watched(reward.amount));
            }
            SdkSignal::Closed => {
                tracing::info!(session = %self.name(), "ad closed");
                self.emit(&AdEvent::Closed);
            }
            SdkSignal::LeavingApplication => {
                tracing::info!(session = %self.name(), "ad leaving application");
                self.shared.state.lock().amount = 0.0;
            }
        }
    }

    fn emit(&self, event: &AdEvent) {
        // Snapshot so a sink may subscribe more sinks.
        let sinks: Vec<_> = self.shared.sinks.lock().clone();
        for sink in sinks {
            sink.deliver(event);
        }
    }
}

impl std::fmt::Debug for AdSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdSession")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("state", &*self.shared.state.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, EditorBackend, EditorProbe};
    use crate::event;
    use adrelay_dispatch::TickOutcome;
    use crossbeam_channel::Receiver;
    use std::thread;

    struct Fixture {
        dispatcher: Dispatcher,
        session: AdSession,
        probe: EditorProbe,
        events: Receiver<AdEvent>,
    }

    fn fixture(config: AdConfig, environment: Environment) -> Fixture {
        let dispatcher = Dispatcher::new();
        let backend = EditorBackend::new();
        let probe = backend.probe();
        let session = AdSession::new(config, environment, backend, dispatcher.clone()).unwrap();
        let (sink, events) = event::channel();
        session.subscribe(sink);
        Fixture {
            dispatcher,
            session,
            probe,
            events,
        }
    }

    fn android() -> Environment {
        Environment::device(Platform::Android, InstallMode::Developer)
            .with_debug_build(false)
            .with_device_id("device-1")
    }

    fn fire_from_sdk_thread(probe: &EditorProbe, signal: SdkSignal) {
        let probe = probe.clone();
        thread::spawn(move || assert!(probe.fire(signal))).join().unwrap();
    }

    fn drain(dispatcher: &Dispatcher) {
        while dispatcher.tick().ran_task() {}
    }

    #[test]
    fn test_sdk_signal_waits_for_tick() {
        let f = fixture(AdConfig::new("video", AdKind::RewardedVideo), android());
        f.session.load_ad().unwrap();
        assert!(f.session.is_loading());

        fire_from_sdk_thread(&f.probe, SdkSignal::Loaded);
        assert!(f.events.try_recv().is_err());
        assert!(f.session.is_loading());

        assert_eq!(f.dispatcher.tick(), TickOutcome::Executed);
        assert_eq!(f.events.try_recv().unwrap(), AdEvent::Loaded);
        assert!(!f.session.is_loading());
        assert!(f.session.is_loaded());
    }

    #[test]
    fn test_reward_sets_amount_and_emits_watched() {
        let f = fixture(AdConfig::new("video", AdKind::RewardedVideo), android());
        f.session.load_ad().unwrap();

        fire_from_sdk_thread(
            &f.probe,
            SdkSignal::EarnedReward(Reward {
                kind: "gems".to_owned(),
                amount: 25.0,
            }),
        );
        fire_from_sdk_thread(&f.probe, SdkSignal::Closed);
        drain(&f.dispatcher);

        assert_eq!(f.events.try_recv().unwrap(), AdEvent::Watched(25.0));
        assert_eq!(f.events.try_recv().unwrap(), AdEvent::Closed);
        assert!((f.session.amount() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failure_resets_amount() {
        let f = fixture(AdConfig::new("video", AdKind::RewardedVideo), android());
        f.session.load_ad().unwrap();
        fire_from_sdk_thread(
            &f.probe,
            SdkSignal::EarnedReward(Reward {
                kind: "gems".to_owned(),
                amount: 5.0,
            }),
        );
        fire_from_sdk_thread(&f.probe, SdkSignal::FailedToShow("expired".to_owned()));
        drain(&f.dispatcher);

        assert_eq!(f.events.try_recv().unwrap(), AdEvent::Watched(5.0));
        assert_eq!(f.events.try_recv().unwrap(), AdEvent::Failed("expired".to_owned()));
        assert!(f.session.amount().abs() < f64::EPSILON);
        assert!(!f.session.is_loading());
    }

    #[test]
    fn test_leaving_application_resets_amount_silently() {
        let f = fixture(AdConfig::new("inter", AdKind::Interstitial), android());
        f.session.load_ad().unwrap();
        fire_from_sdk_thread(
            &f.probe,
            SdkSignal::EarnedReward(Reward {
                kind: "gems".to_owned(),
                amount: 3.0,
            }),
        );
        fire_from_sdk_thread(&f.probe, SdkSignal::LeavingApplication);
        drain(&f.dispatcher);

        assert_eq!(f.events.try_recv().unwrap(), AdEvent::Watched(3.0));
        assert!(f.events.try_recv().is_err());
        assert!(f.session.amount().abs() < f64::EPSILON);
    }

    #[test]
    fn test_init_on_failed_reloads() {
        let mut config = AdConfig::new("retry", AdKind::Interstitial);
        config.behaviour.init_on_failed = true;
        let f = fixture(config, android());

        f.session.load_ad().unwrap();
        fire_from_sdk_thread(&f.probe, SdkSignal::FailedToLoad("no fill".to_owned()));
        drain(&f.dispatcher);

        assert_eq!(f.events.try_recv().unwrap(), AdEvent::Failed("no fill".to_owned()));
        assert_eq!(f.probe.load_count(), 2);
        assert!(f.session.is_loading());
    }

    #[test]
    fn test_play_after_load() {
        let mut config = AdConfig::new("auto", AdKind::Interstitial);
        config.behaviour.play_after_load = true;
        config.behaviour.request_new_after_play = false;
        let f = fixture(config, android());

        f.session.load_ad().unwrap();
        fire_from_sdk_thread(&f.probe, SdkSignal::Loaded);
        drain(&f.dispatcher);

        assert_eq!(f.probe.calls().last(), Some(&BackendCall::Show));
        assert_eq!(f.probe.load_count(), 1);
    }

    #[test]
    fn test_play_requests_new_ad() {
        let f = fixture(AdConfig::new("video", AdKind::RewardedVideo), android());
        assert_eq!(
            f.session.play(),
            Err(AdError::NotInitialized {
                name: "video".to_owned()
            })
        );

        f.session.load_ad().unwrap();
        f.session.play().unwrap();
        let calls = f.probe.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1], BackendCall::Show);
        assert!(matches!(calls[2], BackendCall::Load { .. }));
    }

    #[test]
    fn test_editor_play_grants_fixed_reward() {
        let f = fixture(AdConfig::new("video", AdKind::RewardedVideo), Environment::editor(true));
        f.session.load_ad().unwrap();
        f.session.play().unwrap();

        // Owner thread: delivered synchronously, no tick needed.
        assert_eq!(f.events.try_recv().unwrap(), AdEvent::Watched(10.0));
        assert!((f.session.amount() - 10.0).abs() < f64::EPSILON);
        assert_eq!(f.session.unit_id(), "");
    }

    #[test]
    fn test_editor_outside_play_mode_ignores_enable() {
        let mut config = AdConfig::new("video", AdKind::RewardedVideo);
        config.behaviour.init_on_enable = true;
        let f = fixture(config, Environment::editor(false));

        f.session.on_enable().unwrap();
        assert!(!f.session.is_initialized());
        assert!(f.probe.calls().is_empty());
    }

    #[test]
    fn test_enable_registers_test_devices() {
        let mut config = AdConfig::new("video", AdKind::RewardedVideo);
        config.behaviour.init_on_enable = true;
        config.ids.test_unit_ids.android = Some("android-test-unit".to_owned());
        let f = fixture(config, android());

        f.session.on_enable().unwrap();
        assert_eq!(
            f.probe.calls(),
            vec![BackendCall::Load {
                kind: AdKind::RewardedVideo,
                unit_id: "android-test-unit".to_owned(),
                test_devices: vec![TEST_DEVICE_SIMULATOR.to_owned(), "device-1".to_owned()],
            }]
        );
    }

    #[test]
    fn test_store_install_forces_real_ads() {
        let mut config = AdConfig::new("banner", AdKind::Banner);
        config.behaviour.init_on_enable = true;
        config.ids.app_store_id = "ios-real-unit".to_owned();
        let env = Environment::device(Platform::Ios, InstallMode::Store).with_debug_build(true);
        let f = fixture(config, env);

        f.session.on_enable().unwrap();
        assert!(f.session.is_real_ads());
        assert!(!f.session.is_test());
        assert_eq!(
            f.probe.calls(),
            vec![BackendCall::Load {
                kind: AdKind::Banner,
                unit_id: "ios-real-unit".to_owned(),
                test_devices: Vec::new(),
            }]
        );
        // Banners count as loaded once created.
        assert!(f.session.is_loaded());
    }

    #[test]
    fn test_debug_build_on_device_forces_test_mode() {
        let mut config = AdConfig::new("video", AdKind::RewardedVideo);
        config.debug.is_test = false;
        let env = Environment::device(Platform::Android, InstallMode::Developer).with_debug_build(true);
        let f = fixture(config, env);

        assert!(!f.session.is_test());
        f.session.on_enable().unwrap();
        assert!(f.session.is_test());
    }

    #[test]
    fn test_disable_unloads() {
        let f = fixture(AdConfig::new("video", AdKind::RewardedVideo), android());
        f.session.load_ad().unwrap();
        f.session.on_disable();

        assert!(!f.session.is_initialized());
        assert!(!f.session.is_loaded());
        assert_eq!(f.probe.calls().last(), Some(&BackendCall::Release));
    }

    #[test]
    fn test_disable_drops_signals_already_queued() {
        let f = fixture(AdConfig::new("video", AdKind::RewardedVideo), android());
        f.session.load_ad().unwrap();
        fire_from_sdk_thread(&f.probe, SdkSignal::Loaded);
        assert_eq!(f.dispatcher.pending(), 1);

        f.session.on_disable();
        drain(&f.dispatcher);

        assert!(f.events.try_recv().is_err());
        assert!(!f.session.is_loading());
        assert!(!f.session.is_loaded());
    }

    #[test]
    fn test_disable_keeps_unit_when_configured() {
        let mut config = AdConfig::new("video", AdKind::RewardedVideo);
        config.behaviour.unload_on_disable = false;
        let f = fixture(config, android());
        f.session.load_ad().unwrap();
        f.session.on_disable();

        assert!(f.session.is_initialized());
        assert_eq!(f.probe.load_count(), 1);
        assert_eq!(f.probe.calls().len(), 1);
    }

    #[test]
    fn test_banner_hide_only_for_banners() {
        let banner = fixture(AdConfig::new("footer", AdKind::Banner), android());
        banner.session.load_ad().unwrap();
        banner.session.banner_hide();
        assert_eq!(banner.probe.calls().last(), Some(&BackendCall::Hide));

        let video = fixture(AdConfig::new("video", AdKind::RewardedVideo), android());
        video.session.load_ad().unwrap();
        video.session.banner_hide();
        assert!(!video.probe.calls().contains(&BackendCall::Hide));
    }

    #[test]
    fn test_dropped_session_silences_queued_signals() {
        let f = fixture(AdConfig::new("video", AdKind::RewardedVideo), android());
        f.session.load_ad().unwrap();
        fire_from_sdk_thread(&f.probe, SdkSignal::Loaded);

        let Fixture {
            dispatcher,
            session,
            events,
            ..
        } = f;
        drop(session);

        assert_eq!(dispatcher.tick(), TickOutcome::Executed);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_conflicting_flags_rejected_at_construction() {
        let mut config = AdConfig::new("loop", AdKind::Interstitial);
        config.behaviour.play_after_load = true;
        let result = AdSession::new(config, android(), EditorBackend::new(), Dispatcher::new());
        assert!(matches!(result, Err(AdError::ConflictingFlags { .. })));
    }
}
