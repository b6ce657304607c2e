//! # Dispatch Error Types
//!
//! Faults a dispatched task can raise. They are reported, never propagated
//! out of a tick.

use thiserror::Error;

/// A task that did not complete normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskFault {
    /// The task panicked.
    #[error("task `{label}` panicked: {message}")]
    Panicked {
        /// Label of the task.
        label: &'static str,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// A fallible task returned an error.
    #[error("task `{label}` failed: {message}")]
    Failed {
        /// Label of the task.
        label: &'static str,
        /// Rendered error.
        message: String,
    },
}

impl TaskFault {
    /// Label of the task that faulted.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Panicked { label, .. } | Self::Failed { label, .. } => label,
        }
    }

    /// Human-readable cause.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Panicked { message, .. } | Self::Failed { message, .. } => message,
        }
    }
}
