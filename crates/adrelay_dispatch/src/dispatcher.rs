//! # Main-Thread Dispatcher
//!
//! A locked FIFO with one consumer (the owner thread) and any number of
//! producers.
//!
//! ## Lock Discipline
//!
//! ```text
//! enqueue (foreign thread):  lock ─ push_back ─ unlock
//! enqueue (owner thread):    run now, no lock
//! tick    (owner thread):    lock ─ pop_front ─ run ─ unlock
//! ```
//!
//! The task runs with the queue lock held. A slow task therefore stalls
//! producers for the length of that tick. This is a known limitation and is
//! kept as-is. The lock is re-entrant so a running task may query or
//! re-enter the dispatcher from the owner thread.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::affinity::OwnerThread;
use crate::error::TaskFault;
use crate::stats::{DispatchStats, StatsCounters};
use crate::task::Task;

/// Result of a single [`Dispatcher::tick`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The queue was empty.
    Idle,
    /// One task ran to completion.
    Executed,
    /// One task ran and faulted. The fault has already been logged.
    Faulted(TaskFault),
    /// `tick` was called off the owner thread and did nothing.
    ForeignThread,
}

impl TickOutcome {
    /// Returns `true` if a task was taken off the queue.
    #[inline]
    #[must_use]
    pub fn ran_task(&self) -> bool {
        matches!(self, Self::Executed | Self::Faulted(_))
    }
}

/// Consumer-side state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatcherState {
    /// No task is running.
    Idle,
    /// A dequeued task is running.
    Draining,
}

struct Inner {
    owner: OwnerThread,
    queue: ReentrantMutex<RefCell<VecDeque<Task>>>,
    /// Nesting depth of running ticks (a task may tick re-entrantly).
    draining: AtomicUsize,
    stats: StatsCounters,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let discarded = self.queue.get_mut().get_mut().len();
        if discarded > 0 {
            tracing::debug!(discarded, "dispatcher dropped with pending tasks");
        }
    }
}

/// Handle to a main-thread dispatcher.
///
/// Cloning is cheap (Arc bump) and every clone feeds the same queue. Hand
/// clones to SDK callbacks, workers, or anything else that must reach the
/// owner thread.
///
/// ## Usage
///
/// ```rust,ignore
/// let dispatcher = Dispatcher::new();          // on the main thread
/// let producer = dispatcher.clone();
/// sdk.on_reward(move |amount| producer.enqueue(move || credit(amount)));
///
/// loop {
///     dispatcher.tick();                       // once per frame
/// }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Creates a dispatcher owned by the calling thread.
    #[must_use]
    pub fn new() -> Self {
        Self::with_owner(OwnerThread::current())
    }

    /// Creates a dispatcher owned by `owner`.
    #[must_use]
    pub fn with_owner(owner: OwnerThread) -> Self {
        Self {
            inner: Arc::new(Inner {
                owner,
                queue: ReentrantMutex::new(RefCell::new(VecDeque::new())),
                draining: AtomicUsize::new(0),
                stats: StatsCounters::default(),
            }),
        }
    }

    /// The thread that drains this dispatcher.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> OwnerThread {
        self.inner.owner
    }

    /// Returns `true` when called on the owner thread.
    #[inline]
    #[must_use]
    pub fn is_owner_thread(&self) -> bool {
        self.inner.owner.is_current()
    }

    /// Schedules `f` on the owner thread.
    ///
    /// On the owner thread `f` runs before this returns and never touches
    /// the queue; a panic in `f` propagates to the caller. On any other
    /// thread `f` is appended to the queue and this returns at once.
    pub fn enqueue<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue_task(Task::new(f));
    }

    /// Schedules a fallible closure. An `Err` is logged and counted as a
    /// fault, on either path.
    pub fn enqueue_fallible<F, E>(&self, f: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        self.enqueue_task(Task::fallible(f));
    }

    /// Schedules a prepared [`Task`].
    pub fn enqueue_task(&self, task: Task) {
        if self.inner.owner.is_current() {
            self.inner.stats.record_inline();
            if let Err(fault) = task.invoke_inline() {
                self.report(&fault);
            }
            return;
        }

        let guard = self.inner.queue.lock();
        let mut queue = guard.borrow_mut();
        queue.push_back(task);
        self.inner.stats.record_queued(queue.len());
    }

    /// Runs at most one queued task. Call once per frame on the owner thread.
    ///
    /// Never propagates a task's panic or error: the fault is logged,
    /// counted, and returned as [`TickOutcome::Faulted`].
    ///
    /// An idle tick leaves the queue and state untouched. It only bumps the
    /// diagnostic `ticks` and `idle_ticks` counters in [`DispatchStats`].
    pub fn tick(&self) -> TickOutcome {
        if !self.inner.owner.is_current() {
            tracing::trace!("tick ignored off the owner thread");
            return TickOutcome::ForeignThread;
        }
        self.inner.stats.record_tick();

        let guard = self.inner.queue.lock();
        let next = guard.borrow_mut().pop_front();
        let Some(task) = next else {
            self.inner.stats.record_idle();
            return TickOutcome::Idle;
        };

        self.inner.draining.fetch_add(1, Ordering::AcqRel);
        let result = task.invoke_isolated();
        self.inner.draining.fetch_sub(1, Ordering::AcqRel);
        drop(guard);

        self.inner.stats.record_executed();
        match result {
            Ok(()) => TickOutcome::Executed,
            Err(fault) => {
                self.report(&fault);
                TickOutcome::Faulted(fault)
            }
        }
    }

    /// Number of tasks waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().borrow().len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }

    /// Whether a dequeued task is currently running.
    #[must_use]
    pub fn state(&self) -> DispatcherState {
        if self.inner.draining.load(Ordering::Acquire) > 0 {
            DispatcherState::Draining
        } else {
            DispatcherState::Idle
        }
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        self.inner.stats.snapshot()
    }

    fn report(&self, fault: &TaskFault) {
        self.inner.stats.record_fault();
        tracing::error!(task = fault.label(), %fault, "dispatched task faulted");
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("owner", &self.inner.owner)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
