//! # ADRELAY Demo
//!
//! Headless run of every configured ad session against the simulated SDK.
//! SDK callbacks fire on worker threads; the frame loop delivers them here.
//!
//! ```bash
//! # Default config
//! adrelay_demo
//!
//! # Custom config, verbose
//! RUST_LOG=adrelay=debug,adrelay_ads=debug adrelay_demo path/to/adrelay.toml
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use adrelay::ads::{AdEvent, AdKind, AdSession, Environment, SimulatedBackend};
use adrelay::dispatch::Dispatcher;
use adrelay::{AppConfig, FrameLoop, HostResult};
use crossbeam_channel::unbounded;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/adrelay.toml";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);

    match AppConfig::load(&path).and_then(|config| run(&config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(path = %path.display(), %err, "demo aborted");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig) -> HostResult<()> {
    let dispatcher = Dispatcher::new();
    let environment = Environment::default().with_device_id("adrelay-demo");
    let (tx, events) = unbounded::<(String, AdEvent)>();

    let mut sessions = Vec::with_capacity(config.ads.len());
    for (index, ad) in config.ads.iter().enumerate() {
        let mut sdk = config.simulated.clone();
        sdk.seed = sdk.seed.wrapping_add(index as u64);
        let session = AdSession::new(
            ad.clone(),
            environment.clone(),
            SimulatedBackend::new(sdk),
            dispatcher.clone(),
        )?;

        let tx = tx.clone();
        let name = ad.name.clone();
        session.on_event(move |event| {
            let _ = tx.send((name.clone(), event.clone()));
        });
        session.on_enable()?;
        if !ad.behaviour.init_on_enable {
            session.load_ad()?;
        }
        tracing::info!(session = %ad.name, kind = %ad.kind, unit_id = %session.unit_id(), "session started");
        sessions.push(session);
    }

    if sessions.is_empty() {
        tracing::warn!("no [[ads]] configured, nothing to do");
        return Ok(());
    }

    let mut frame_loop = FrameLoop::new(dispatcher, config.host);
    frame_loop.play();

    let mut plays = 0_u32;
    let mut banners_shown = HashSet::new();
    frame_loop.run(|_| {
        while let Ok((name, event)) = events.try_recv() {
            tracing::info!(session = %name, event = event.name(), ?event, "ad event");
            if event != AdEvent::Loaded {
                continue;
            }
            let Some(session) = sessions.iter().find(|s| s.name() == name) else {
                continue;
            };
            if session.config().behaviour.play_after_load {
                continue;
            }
            // Banners stay up once shown.
            if session.kind() == AdKind::Banner && !banners_shown.insert(name) {
                continue;
            }
            plays += play_if_ready(session);
        }
        true
    });

    for session in &sessions {
        tracing::info!(session = %session.name(), amount = session.amount(), "final reward");
        session.on_disable();
    }
    frame_loop.stats().log_summary();
    let stats = frame_loop.dispatcher().stats();
    tracing::info!(
        plays,
        inline = stats.inline_runs,
        queued = stats.queued,
        peak_pending = stats.peak_pending,
        "dispatcher totals"
    );
    Ok(())
}

fn play_if_ready(session: &AdSession) -> u32 {
    if !session.is_loaded() {
        return 0;
    }
    match session.play() {
        Ok(()) => 1,
        Err(err) => {
            tracing::warn!(session = %session.name(), %err, "play failed");
            0
        }
    }
}
