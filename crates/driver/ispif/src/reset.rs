//! Reset protocol.
//!
//! A reset is a write of strobe bits to the reset command register of a
//! VFE bank, acknowledged by the reset-done interrupt. The completion is
//! re-armed right before the write, so an acknowledgment of an earlier
//! reset can never satisfy the wait.

use std::time::Duration;

use ispif_core::sync::Completion;
use ispif_core::{InterfaceLane, VfeInstance};
use ispif_mmio::RegisterPort;
use log::{debug, warn};

use crate::error::IspifError;
use crate::layout::lane_info;
use crate::regs::{IspifGlobalRegs, RST_CMD_1_MASK, RST_CMD_MASK, ResetCmd};

/// Composes the per-interface reset word for `lanes`.
#[must_use]
pub fn lane_reset_cmd(lanes: impl IntoIterator<Item = InterfaceLane>) -> ResetCmd {
    lanes
        .into_iter()
        .fold(ResetCmd::STROBED_RST_EN, |cmd, lane| cmd | lane_info(lane).reset)
}

/// Issues resets and waits for their acknowledgment.
pub struct ResetSequencer<'a> {
    regs: IspifGlobalRegs<'a>,
    done: &'a Completion,
    timeout: Duration,
}

impl<'a> ResetSequencer<'a> {
    /// Creates a sequencer over a mapped register window.
    #[must_use]
    pub fn new(port: &'a dyn RegisterPort, done: &'a Completion, timeout: Duration) -> Self {
        Self {
            regs: IspifGlobalRegs::new(port, 0),
            done,
            timeout,
        }
    }

    /// Resets every lane. `dual_vfe` also resets the VFE1 bank.
    ///
    /// # Errors
    ///
    /// [`IspifError::ResetTimeout`] if reset done is not reported in time.
    pub fn global(&self, dual_vfe: bool) -> Result<(), IspifError> {
        self.done.reinit();
        if dual_vfe {
            self.regs.set_rst_cmd(RST_CMD_MASK);
            self.regs.set_rst_cmd_1_barrier(RST_CMD_1_MASK);
        } else {
            self.regs.set_rst_cmd_barrier(RST_CMD_MASK);
        }
        self.wait("global")
    }

    /// Resets the named lanes of `vfe`.
    ///
    /// Nothing is written when `lanes` is empty.
    ///
    /// # Errors
    ///
    /// [`IspifError::ResetTimeout`] if reset done is not reported in time.
    pub fn lanes(
        &self,
        vfe: VfeInstance,
        lanes: impl IntoIterator<Item = InterfaceLane>,
    ) -> Result<(), IspifError> {
        let cmd = lane_reset_cmd(lanes);
        if cmd == ResetCmd::STROBED_RST_EN {
            return Ok(());
        }
        self.done.reinit();
        match vfe {
            VfeInstance::Vfe0 => self.regs.set_rst_cmd_barrier(cmd),
            VfeInstance::Vfe1 => self.regs.set_rst_cmd_1_barrier(cmd),
        }
        self.wait("interface")
    }

    fn wait(&self, kind: &str) -> Result<(), IspifError> {
        if self.done.wait_timeout(self.timeout) {
            debug!("ISPIF: {kind} reset done");
            Ok(())
        } else {
            warn!("ISPIF: {kind} reset timed out after {:?}", self.timeout);
            Err(IspifError::ResetTimeout)
        }
    }
}
