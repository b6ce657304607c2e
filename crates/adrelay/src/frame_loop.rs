//! # Frame Loop
//!
//! Drives the main-thread dispatcher the way an engine update loop would:
//!
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────┐
//! │ 1. BEGIN FRAME   delta since frame N-1                   │
//! │ 2. PUMP          dispatcher.tick() (Playing only)        │
//! │                  └─ at most one queued task runs         │
//! │ 3. END FRAME     record FrameStats, warn if over budget  │
//! │ 4. PACE          sleep out the rest of the frame budget  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The thread that constructs the [`Dispatcher`] is its owner; build the
//! loop and call [`FrameLoop::frame`] on that same thread.

use std::thread;
use std::time::{Duration, Instant};

use adrelay_dispatch::{Dispatcher, TickOutcome};

use crate::config::HostConfig;

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Whether the loop pumps the dispatcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayState {
    /// Not running. Frames still advance but nothing is dispatched.
    #[default]
    Stopped,
    /// Running. One task per frame.
    Playing,
    /// Suspended. Queued tasks wait.
    Paused,
}

/// What happened in one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Time since the previous frame began, in microseconds.
    pub delta_us: u64,
    /// Time spent in `tick`, in microseconds.
    pub tick_us: u64,
    /// The dispatcher was ticked.
    pub ticked: bool,
    /// A task ran to completion.
    pub executed: bool,
    /// A task faulted.
    pub faulted: bool,
    /// Tasks still queued after the tick.
    pub pending: usize,
}

/// Owns the dispatcher and counts frames.
pub struct FrameLoop {
    dispatcher: Dispatcher,
    config: HostConfig,
    state: PlayState,
    frame_count: u64,
    last_frame_time: Instant,
    stats_accumulator: FrameStatsAccumulator,
}

impl FrameLoop {
    /// Creates a stopped loop around `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: HostConfig) -> Self {
        let budget = config.frame_budget();
        Self {
            dispatcher,
            config,
            state: PlayState::Stopped,
            frame_count: 0,
            last_frame_time: Instant::now(),
            stats_accumulator: FrameStatsAccumulator::with_budget(budget),
        }
    }

    /// The dispatcher this loop pumps.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Current play state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Enters play mode.
    pub fn play(&mut self) {
        self.set_state(PlayState::Playing);
    }

    /// Suspends dispatching. Queued tasks are kept.
    pub fn pause(&mut self) {
        self.set_state(PlayState::Paused);
    }

    /// Leaves play mode.
    pub fn stop(&mut self) {
        self.set_state(PlayState::Stopped);
    }

    fn set_state(&mut self, state: PlayState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, frame = self.frame_count, "play state changed");
            self.state = state;
        }
    }

    /// Runs one frame: ticks the dispatcher if playing and records stats.
    pub fn frame(&mut self) -> FrameStats {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time);
        self.last_frame_time = now;

        let mut stats = FrameStats {
            frame: self.frame_count,
            delta_us: saturating_micros(delta),
            ..FrameStats::default()
        };

        if self.state == PlayState::Playing {
            let started = Instant::now();
            let outcome = self.dispatcher.tick();
            stats.tick_us = saturating_micros(started.elapsed());
            stats.ticked = true;
            match outcome {
                TickOutcome::Executed => stats.executed = true,
                TickOutcome::Faulted(_) => stats.faulted = true,
                TickOutcome::Idle => {}
                TickOutcome::ForeignThread => {
                    tracing::warn!(frame = self.frame_count, "frame loop is not on the dispatcher's owner thread");
                }
            }
        }
        stats.pending = self.dispatcher.pending();

        self.end_frame(stats);
        stats
    }

    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.stats_accumulator.record(stats);

        let budget = self.config.frame_budget();
        if self.config.log_slow_frames && stats.tick_us > saturating_micros(budget) {
            tracing::warn!(
                frame = stats.frame,
                tick_ms = stats.tick_us as f64 / 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "frame exceeded budget"
            );
        }
    }

    /// Runs paced frames while `keep_going` returns `true`, up to
    /// `max_frames` if configured. Returns the number of frames run.
    pub fn run<F>(&mut self, mut keep_going: F) -> u64
    where
        F: FnMut(&FrameStats) -> bool,
    {
        let budget = self.config.frame_budget();
        let mut ran = 0;
        loop {
            if self.config.max_frames != 0 && ran >= self.config.max_frames {
                break;
            }
            let started = Instant::now();
            let stats = self.frame();
            ran += 1;
            if !keep_going(&stats) {
                break;
            }
            if let Some(rest) = budget.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        ran
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

impl std::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("state", &self.state)
            .field("frame_count", &self.frame_count)
            .field("pending", &self.dispatcher.pending())
            .finish_non_exhaustive()
    }
}

fn saturating_micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Frames in which the dispatcher was ticked.
    pub frames_ticked: u64,
    /// Sum of tick times.
    pub tick_us_sum: u64,
    /// Min tick time over ticked frames.
    pub min_tick_us: u64,
    /// Max tick time.
    pub max_tick_us: u64,
    /// Sum of frame deltas.
    pub delta_us_sum: u64,
    /// Tasks that completed.
    pub tasks_executed: u64,
    /// Tasks that faulted.
    pub faults: u64,
    /// Ticks that exceeded the frame budget.
    pub frames_over_budget: u64,
    /// Frame budget in microseconds.
    pub budget_us: u64,
}

impl FrameStatsAccumulator {
    /// Creates an accumulator with the 60 FPS budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_budget(TARGET_FRAME_TIME)
    }

    /// Creates an accumulator with a custom frame budget.
    #[must_use]
    pub fn with_budget(budget: Duration) -> Self {
        Self {
            frames_recorded: 0,
            frames_ticked: 0,
            tick_us_sum: 0,
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            delta_us_sum: 0,
            tasks_executed: 0,
            faults: 0,
            frames_over_budget: 0,
            budget_us: saturating_micros(budget),
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.delta_us_sum = self.delta_us_sum.saturating_add(stats.delta_us);
        if stats.executed {
            self.tasks_executed += 1;
        }
        if stats.faulted {
            self.faults += 1;
        }
        if !stats.ticked {
            return;
        }

        self.frames_ticked += 1;
        self.tick_us_sum = self.tick_us_sum.saturating_add(stats.tick_us);
        self.min_tick_us = self.min_tick_us.min(stats.tick_us);
        self.max_tick_us = self.max_tick_us.max(stats.tick_us);
        if stats.tick_us > self.budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Average tick time in milliseconds.
    #[must_use]
    pub fn avg_tick_ms(&self) -> f64 {
        if self.frames_ticked == 0 {
            return 0.0;
        }
        (self.tick_us_sum as f64 / self.frames_ticked as f64) / 1000.0
    }

    /// Average frame interval in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.delta_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Share of ticked frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_ticked == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_ticked as f64
    }

    /// Logs a summary at info level.
    pub fn log_summary(&self) {
        let min_tick_us = if self.frames_ticked == 0 { 0 } else { self.min_tick_us };
        tracing::info!(
            frames = self.frames_recorded,
            ticked = self.frames_ticked,
            avg_frame_ms = format_args!("{:.3}", self.avg_frame_ms()),
            avg_fps = format_args!("{:.1}", self.avg_fps()),
            "frame timing"
        );
        tracing::info!(
            avg_tick_ms = format_args!("{:.3}", self.avg_tick_ms()),
            min_tick_us,
            max_tick_us = self.max_tick_us,
            over_budget = self.frames_over_budget,
            over_budget_pct = format_args!("{:.1}", self.over_budget_ratio() * 100.0),
            "dispatcher timing"
        );
        tracing::info!(executed = self.tasks_executed, faults = self.faults, "dispatched tasks");
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
