//! Platform service contracts.
//!
//! The controller reaches clocks, the register window and the interrupt
//! line only through [`Platform`], so it can be driven by a real host
//! integration or by the [`sim`](crate::sim) platform on a development
//! machine.

use std::sync::Arc;

use ispif_mmio::RegisterPort;

use crate::error::{ClockError, IspifError};
use crate::irq::InterruptReactor;

/// Named clock control.
pub trait ClockPort: Send + Sync {
    /// Enables every clock in `names`, in order.
    ///
    /// On failure, clocks enabled by this call are disabled again before
    /// returning.
    fn enable(&self, names: &[&'static str]) -> Result<(), ClockError>;

    /// Disables every clock in `names`.
    fn disable(&self, names: &[&'static str]);

    /// Sets the rate of clock `name`.
    fn set_rate(&self, name: &'static str, rate: u64) -> Result<(), ClockError>;
}

/// Host services the controller needs while powered up.
pub trait Platform: Send + Sync {
    /// Returns the clock port.
    fn clocks(&self) -> &dyn ClockPort;

    /// Maps the ISPIF register window.
    fn map_registers(&self) -> Result<Arc<dyn RegisterPort>, IspifError>;

    /// Unmaps the window returned by [`map_registers`](Self::map_registers).
    fn unmap_registers(&self);

    /// Installs `reactor` as the interrupt handler of the ISPIF line.
    ///
    /// The host calls [`InterruptReactor::handle_irq`] once per interrupt.
    fn request_irq(&self, reactor: Arc<InterruptReactor>) -> Result<(), IspifError>;

    /// Uninstalls the interrupt handler.
    fn free_irq(&self);
}
