//! Camera ISP interface (ISPIF) routing controller.
//!
//! The ISPIF sits between the CSI decoders (CSID) and the image front ends
//! (VFE). This crate drives it: routing lanes to CSID sources, enabling
//! virtual channels, sequencing frame-boundary start/stop commands and
//! resets, and accounting start-of-frame and overflow interrupts.
//!
//! The entry point is [`Ispif`], generic over the [`Platform`] that
//! provides clocks, the register window and the interrupt line. The
//! [`sim`] module provides a host platform for tests and tools.
//!
//! # Example
//!
//! ```ignore
//! let ispif = Ispif::new(SimPlatform::new(), IspifConfig::default());
//! ispif.init(2)?;
//! ispif.configure(&request)?;
//! ispif.start_frame_boundary(&request)?;
//! ```

#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod irq;
pub mod layout;
pub mod platform;
pub mod regs;
pub mod request;
pub mod reset;
pub mod sim;

pub use command::{AppliedCommand, FrameCommand};
pub use config::{ConfigError, IdlePollConfig, IspifConfig};
pub use controller::{Ispif, IspifCommand};
pub use error::{ClockError, IspifError};
pub use irq::{InterruptReactor, IrqEvents, IrqSnapshot};
pub use platform::{ClockPort, Platform};
pub use request::{RoutingEntry, RoutingRequest};
