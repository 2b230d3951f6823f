//! One-shot completion for interrupt-driven wakeups.
//!
//! A [`Completion`] is armed by the waiter, fired by the interrupt handler
//! and observed by the waiter with a bounded wait. It is independent of any
//! command lock, so the firing side never blocks behind a long-running
//! command.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A re-armable one-shot completion.
///
/// # Example
///
/// ```ignore
/// let done = Completion::new();
///
/// // Waiter:
/// done.reinit();
/// start_hardware_reset();
/// if !done.wait_timeout(Duration::from_millis(500)) {
///     return Err(Error::ResetTimeout);
/// }
///
/// // Interrupt handler:
/// done.complete();
/// ```
#[derive(Debug, Default)]
pub struct Completion {
    done: Mutex<bool>,
    cond: Condvar,
}

impl Completion {
    /// Creates an armed (not yet completed) completion.
    #[must_use]
    pub fn new() -> Self {
        Self {
            done: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Re-arms the completion. Must be called before the event is requested.
    pub fn reinit(&self) {
        *self.flag() = false;
    }

    /// Marks the completion as done and wakes every waiter.
    ///
    /// The critical section is a single store, so this is safe to call from
    /// the interrupt path.
    pub fn complete(&self) {
        *self.flag() = true;
        self.cond.notify_all();
    }

    /// Returns `true` if [`complete`](Self::complete) was called since the
    /// last [`reinit`](Self::reinit).
    #[must_use]
    pub fn is_completed(&self) -> bool {
        *self.flag()
    }

    /// Blocks until completed or `timeout` elapses.
    ///
    /// Returns `true` if the completion fired, `false` on timeout.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.flag();
        let (guard, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
