//! Loom compatibility shim.
//!
//! When compiled with `cfg(loom)`, re-exports loom's atomic types.
//! Otherwise, re-exports the standard `core::sync::atomic` types.
//!
//! This allows the counters to be tested under loom's deterministic
//! scheduler without code changes.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU64, Ordering};

#[cfg(not(loom))]
pub(crate) use core::sync::atomic::{AtomicU64, Ordering};
