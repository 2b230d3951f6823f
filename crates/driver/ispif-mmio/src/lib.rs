//! Register port abstraction and typed register blocks.
//!
//! [`RegisterPort`] is the boundary to whatever actually performs 32-bit
//! register I/O: a mapped MMIO window on hardware, or a simulated register
//! file on the host. This crate also re-exports the [`register_block!`]
//! macro from `ispif-mmio-macros`, which generates typed accessor structs
//! over a port from a declarative definition.
//!
//! # Example
//!
//! ```ignore
//! use ispif_mmio::register_block;
//!
//! register_block! {
//!     /// Per-VFE interrupt registers.
//!     pub VfeIrqRegs {
//!         /// Interrupt mask, bank 0.
//!         [0x208; u32; rw] irq_mask_0,
//!         /// Interrupt status, bank 0.
//!         [0x21C; u32; ro] irq_status_0,
//!     }
//! }
//!
//! let regs = VfeIrqRegs::new(&*port, 0x200);
//! let status = regs.irq_status_0();
//! ```

#![warn(missing_docs)]

pub use ispif_mmio_macros::register_block;

/// 32-bit register access against a mapped register window.
///
/// Offsets are byte offsets from the start of the window. Implementations
/// must be callable concurrently from command and interrupt context.
pub trait RegisterPort: Send + Sync {
    /// Reads the register at `offset`.
    fn read32(&self, offset: u32) -> u32;

    /// Writes `value` to the register at `offset`.
    ///
    /// The write may be posted: it is not ordered against later accesses
    /// issued from other contexts.
    fn write32(&self, offset: u32, value: u32);

    /// Writes `value` to the register at `offset` and orders it before any
    /// subsequent read or write issued by any context.
    fn write32_barrier(&self, offset: u32, value: u32);
}
