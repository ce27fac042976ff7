//! Parameter-change notification between the audio thread and the display.
//!
//! The audio thread bumps a revision counter; each subscriber remembers the
//! last revision it acted on and sees a pending change exactly once.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ChangeNotifier {
    revision: AtomicU64,
    subscribers: AtomicUsize,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the parameters as changed. Real-time safe.
    #[inline]
    pub fn notify(&self) {
        self.revision.fetch_add(1, Ordering::Release);
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Registers a listener. A fresh subscription starts with one change
    /// pending so the first display tick always builds its state.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        self.subscribers.fetch_add(1, Ordering::AcqRel);
        let seen = self.revision().wrapping_sub(1);
        Subscription {
            notifier: Arc::clone(self),
            seen,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::Acquire)
    }
}

/// Handle to a [`ChangeNotifier`]. Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    notifier: Arc<ChangeNotifier>,
    seen: u64,
}

impl Subscription {
    /// `true` once for every batch of changes since the last call.
    pub fn take_pending(&mut self) -> bool {
        let current = self.notifier.revision();
        if current == self.seen {
            return false;
        }
        self.seen = current;
        true
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.notifier.subscribers.fetch_sub(1, Ordering::AcqRel);
    }
}
