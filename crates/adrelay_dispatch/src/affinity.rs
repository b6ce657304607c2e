//! Thread affinity for the dispatcher's consumer side.

use std::thread::{self, ThreadId};

/// The thread allowed to drain a dispatcher.
///
/// Captured once when the dispatcher is built and compared against
/// [`thread::current`] on every `enqueue` and `tick`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OwnerThread {
    id: ThreadId,
}

impl OwnerThread {
    /// Designates the calling thread as owner.
    #[must_use]
    pub fn current() -> Self {
        Self {
            id: thread::current().id(),
        }
    }

    /// Designates an arbitrary thread as owner.
    ///
    /// Useful when the frame loop runs on a thread spawned by the host:
    /// `OwnerThread::from_id(handle.thread().id())`.
    #[must_use]
    pub fn from_id(id: ThreadId) -> Self {
        Self { id }
    }

    /// Returns the owner's thread id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Returns `true` when called on the owner thread.
    #[inline]
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_thread_is_owner() {
        let owner = OwnerThread::current();
        assert!(owner.is_current());
        assert_eq!(owner.id(), thread::current().id());
    }

    #[test]
    fn test_other_thread_is_not_owner() {
        let owner = OwnerThread::current();
        let seen_as_owner = thread::spawn(move || owner.is_current()).join().unwrap();
        assert!(!seen_as_owner);
    }

    #[test]
    fn test_from_spawned_thread_id() {
        let handle = thread::spawn(|| OwnerThread::current());
        let spawned_id = handle.thread().id();
        let owner = handle.join().unwrap();
        assert_eq!(owner, OwnerThread::from_id(spawned_id));
        assert!(!owner.is_current());
    }
}
