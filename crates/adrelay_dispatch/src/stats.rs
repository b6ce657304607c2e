//! Dispatcher counters.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Snapshot of a dispatcher's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Tasks run immediately because they were enqueued on the owner thread.
    pub inline_runs: u64,
    /// Tasks pushed onto the queue from other threads.
    pub queued: u64,
    /// Queued tasks taken off the queue and invoked.
    pub executed: u64,
    /// Tasks that panicked or returned an error, on either path.
    pub faulted: u64,
    /// Ticks that ran on the owner thread.
    pub ticks: u64,
    /// Ticks that found the queue empty.
    pub idle_ticks: u64,
    /// Largest queue length observed right after an enqueue.
    pub peak_pending: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    inline_runs: AtomicU64,
    queued: AtomicU64,
    executed: AtomicU64,
    faulted: AtomicU64,
    ticks: AtomicU64,
    idle_ticks: AtomicU64,
    peak_pending: AtomicUsize,
}

impl StatsCounters {
    pub(crate) fn record_inline(&self) {
        self.inline_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_queued(&self, pending_after: usize) {
        self.queued.fetch_add(1, Ordering::Relaxed);
        self.peak_pending.fetch_max(pending_after, Ordering::Relaxed);
    }

    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_idle(&self) {
        self.idle_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self) {
        self.faulted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            inline_runs: self.inline_runs.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            faulted: self.faulted.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            idle_ticks: self.idle_ticks.load(Ordering::Relaxed),
            peak_pending: self.peak_pending.load(Ordering::Relaxed),
        }
    }
}
