//! # Ad Events
//!
//! The four things application code hears about an ad session. Events are
//! always delivered on the dispatcher's owner thread.
//!
//! ```text
//! SDK thread ── SdkSignal ──> Dispatcher ──> AdSession ──> AdEvent ──> EventSink(s)
//! ```

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Application-facing ad event.
#[derive(Clone, Debug, PartialEq)]
pub enum AdEvent {
    /// An ad finished loading.
    Loaded,
    /// Loading or showing failed. Carries the SDK's message.
    Failed(String),
    /// A rewarded video was watched. Carries the reward amount.
    Watched(f64),
    /// The ad was closed.
    Closed,
}

impl AdEvent {
    /// Short name for log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Failed(_) => "failed",
            Self::Watched(_) => "watched",
            Self::Closed => "closed",
        }
    }
}

/// Receives ad events on the owner thread.
pub trait EventSink: Send + Sync {
    /// Handles one event.
    fn deliver(&self, event: &AdEvent);
}

impl<F> EventSink for F
where
    F: Fn(&AdEvent) + Send + Sync,
{
    fn deliver(&self, event: &AdEvent) {
        self(event);
    }
}

/// Forwards events into a crossbeam channel.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    sender: Sender<AdEvent>,
}

impl ChannelSink {
    /// Wraps an existing sender.
    #[must_use]
    pub fn new(sender: Sender<AdEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: &AdEvent) {
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!(event = event.name(), "event receiver dropped");
        }
    }
}

/// Creates an unbounded sink/receiver pair.
#[must_use]
pub fn channel() -> (ChannelSink, Receiver<AdEvent>) {
    let (sender, receiver) = unbounded();
    (ChannelSink::new(sender), receiver)
}
