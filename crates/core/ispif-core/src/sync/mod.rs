//! Synchronization primitives shared between command and interrupt context.
//!
//! The command path serializes itself behind a coarse lock; the interrupt
//! path must never wait on that lock. Everything the interrupt path writes
//! therefore goes through the primitives in this module: [`EventCounter`]
//! for lock-free counters and [`Completion`] for one-shot wakeups.

mod completion;
mod counter;

pub(crate) mod loom_compat;

pub use completion::Completion;
pub use counter::EventCounter;
