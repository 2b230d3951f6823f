//! Lock-free event counter.

use super::loom_compat::{AtomicU64, Ordering};

/// A monotonic event counter that can be bumped from interrupt context.
///
/// Only the interrupt path increments; the command path resets it while
/// the hardware source it counts is held in reset, so relaxed ordering is
/// sufficient for both sides.
#[derive(Debug)]
pub struct EventCounter {
    count: AtomicU64,
}

impl EventCounter {
    /// Creates a counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// Records one event.
    #[inline]
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of events recorded since the last reset.
    #[inline]
    #[must_use]
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Resets the counter to zero.
    #[inline]
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

impl Default for EventCounter {
    fn default() -> Self {
        Self::new()
    }
}
