//! Core types and synchronization primitives for the ISPIF controller.
//!
//! This crate contains the host-testable pieces shared by the driver and
//! its tooling: strongly typed identifiers for interface lanes, VFE
//! instances, protocol versions and virtual channels, plus the two
//! primitives the interrupt path relies on (a one-shot [`Completion`] and a
//! lock-free [`EventCounter`]).
//!
//! By living outside the driver crate, these types can be tested with
//! `cargo test` and loom without any register backend.
//!
//! [`Completion`]: sync::Completion
//! [`EventCounter`]: sync::EventCounter

#![warn(missing_docs)]

pub mod id;
pub mod sync;

pub use id::{ChannelId, ChannelSet, InterfaceLane, ProtocolVersion, VfeInstance};
