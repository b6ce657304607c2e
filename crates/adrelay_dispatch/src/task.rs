//! # Dispatched Tasks
//!
//! A [`Task`] is a boxed zero-argument closure plus a static label used in
//! log lines. Infallible closures are stored as fallible ones that always
//! succeed, so the dispatcher has a single invocation path.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::error::TaskFault;

/// Label given to tasks built without one.
pub const ANONYMOUS: &str = "anonymous";

type Run = Box<dyn FnOnce() -> Result<(), String> + Send + 'static>;

/// A unit of work waiting to run on the owner thread.
///
/// Owned by the dispatcher queue from enqueue until it is invoked, then
/// dropped.
pub struct Task {
    label: &'static str,
    run: Run,
}

impl Task {
    /// Wraps an infallible closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            label: ANONYMOUS,
            run: Box::new(move || {
                f();
                Ok(())
            }),
        }
    }

    /// Wraps a closure whose `Err` counts as a task fault.
    pub fn fallible<F, E>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        Self {
            label: ANONYMOUS,
            run: Box::new(move || f().map_err(|e| e.to_string())),
        }
    }

    /// Sets the label reported in logs and faults.
    #[must_use]
    pub fn labeled(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Label of this task.
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Runs the task, converting a panic into [`TaskFault::Panicked`].
    ///
    /// Used on the queued path, where nothing above the dispatcher may
    /// observe the unwind.
    pub(crate) fn invoke_isolated(self) -> Result<(), TaskFault> {
        let Self { label, run } = self;
        match panic::catch_unwind(AssertUnwindSafe(run)) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(TaskFault::Failed { label, message }),
            Err(payload) => Err(TaskFault::Panicked {
                label,
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Runs the task on the caller's stack. Panics propagate to the caller.
    pub(crate) fn invoke_inline(self) -> Result<(), TaskFault> {
        let Self { label, run } = self;
        run().map_err(|message| TaskFault::Failed { label, message })
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
