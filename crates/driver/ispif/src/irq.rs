//! Interrupt reactor.
//!
//! Runs once per ISPIF interrupt: drains and clears the status banks of
//! every serviced VFE, fires the reset completion, reports overflows and
//! counts start-of-frame events. It only touches atomics, the completion
//! and the register port, never the command lock.

use std::sync::Arc;

use ispif_core::sync::{Completion, EventCounter};
use ispif_core::{InterfaceLane, VfeInstance};
use ispif_mmio::RegisterPort;
use log::error;

use crate::layout::lane_info;
use crate::regs::{
    IRQ_GLOBAL_CLEAR_CMD, IRQ_STATUS_0_MASK, IrqStatus0, IspifGlobalRegs, IspifVfeRegs, vfe_base,
};

type LaneCounters = [[EventCounter; InterfaceLane::COUNT]; VfeInstance::COUNT];

fn lane_counters() -> LaneCounters {
    std::array::from_fn(|_| std::array::from_fn(|_| EventCounter::new()))
}

/// State shared between the command path and the interrupt path.
#[derive(Debug)]
pub struct IrqEvents {
    sof: LaneCounters,
    overflow: LaneCounters,
    reset_done: Completion,
}

impl IrqEvents {
    /// Creates zeroed counters and an armed completion.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sof: lane_counters(),
            overflow: lane_counters(),
            reset_done: Completion::new(),
        }
    }

    /// Start-of-frame counter of `lane` on `vfe`.
    #[must_use]
    pub fn sof(&self, vfe: VfeInstance, lane: InterfaceLane) -> &EventCounter {
        &self.sof[vfe.index()][lane.index()]
    }

    /// Overflow counter of `lane` on `vfe`.
    #[must_use]
    pub fn overflow(&self, vfe: VfeInstance, lane: InterfaceLane) -> &EventCounter {
        &self.overflow[vfe.index()][lane.index()]
    }

    /// Completion fired when the hardware reports reset done.
    #[must_use]
    pub fn reset_done(&self) -> &Completion {
        &self.reset_done
    }

    /// Zeroes every counter.
    pub fn reset_counters(&self) {
        for counter in self.sof.iter().chain(&self.overflow).flatten() {
            counter.reset();
        }
    }
}

impl Default for IrqEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Status words drained by one interrupt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IrqSnapshot {
    /// Status banks 0..3 per VFE; zero for a VFE that was not serviced.
    pub status: [[u32; 3]; VfeInstance::COUNT],
}

impl IrqSnapshot {
    /// Returns the drained bank-0 status of `vfe`.
    #[must_use]
    pub fn status0(&self, vfe: VfeInstance) -> IrqStatus0 {
        IrqStatus0::from_bits_retain(self.status[vfe.index()][0])
    }
}

/// The interrupt handler installed while the device is powered up.
pub struct InterruptReactor {
    port: Arc<dyn RegisterPort>,
    dual_vfe: bool,
    events: Arc<IrqEvents>,
}

impl InterruptReactor {
    /// Creates a reactor over a mapped register window.
    ///
    /// `dual_vfe` selects whether the VFE1 bank is serviced.
    #[must_use]
    pub fn new(port: Arc<dyn RegisterPort>, dual_vfe: bool, events: Arc<IrqEvents>) -> Self {
        Self {
            port,
            dual_vfe,
            events,
        }
    }

    /// Services one interrupt.
    pub fn handle_irq(&self) -> IrqSnapshot {
        let mut snapshot = IrqSnapshot::default();
        for vfe in VfeInstance::ALL {
            if vfe == VfeInstance::Vfe1 && !self.dual_vfe {
                break;
            }
            snapshot.status[vfe.index()] = self.service_bank(vfe);
        }
        IspifGlobalRegs::new(&*self.port, 0).set_irq_global_clear_barrier(IRQ_GLOBAL_CLEAR_CMD);
        snapshot
    }

    fn service_bank(&self, vfe: VfeInstance) -> [u32; 3] {
        let regs = IspifVfeRegs::new(&*self.port, vfe_base(vfe));

        let status0 = regs.irq_status_0();
        regs.set_irq_clear_0(status0.bits());
        let status1 = regs.irq_status_1();
        regs.set_irq_clear_1(status1.bits());
        let status2 = regs.irq_status_2();
        regs.set_irq_clear_2_barrier(status2.bits());

        let status = [status0.bits(), status1.bits(), status2.bits()];
        if status[0] & IRQ_STATUS_0_MASK == 0 {
            return status;
        }

        if status0.contains(IrqStatus0::RESET_DONE) {
            self.events.reset_done.complete();
        }
        for lane in InterfaceLane::ALL {
            let info = lane_info(lane);
            if info.overflow.is_some_and(|src| src.is_set(status)) {
                error!("ISPIF: {vfe} {lane} overflow");
                self.events.overflow(vfe, lane).increment();
            }
            if info.sof.is_some_and(|src| src.is_set(status)) {
                self.events.sof(vfe, lane).increment();
            }
        }
        status
    }
}

impl core::fmt::Debug for InterruptReactor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InterruptReactor")
            .field("dual_vfe", &self.dual_vfe)
            .finish_non_exhaustive()
    }
}
