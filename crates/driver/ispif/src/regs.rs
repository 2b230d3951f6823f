//! ISPIF register offsets and bitflags.
//!
//! Defines the register layout of the interface block: a small global
//! section (reset commands, global interrupt clear) and one per-VFE block
//! repeated at a `0x200` stride. Offsets inside [`IspifVfeRegs`] are the
//! VFE0 offsets; the block base selects the instance.

use bitflags::bitflags;
use ispif_core::{InterfaceLane, VfeInstance};
use ispif_mmio::register_block;

// ---------------------------------------------------------------------------
// Global registers
// ---------------------------------------------------------------------------

register_block! {
    /// ISPIF registers shared by both VFE instances.
    pub IspifGlobalRegs {
        /// Reset command, VFE0 bank.
        [0x008; u32; wo] rst_cmd => ResetCmd,
        /// Reset command, VFE1 bank (V3 only).
        [0x00C; u32; wo] rst_cmd_1 => ResetCmd,
        /// Global interrupt clear command.
        [0x01C; u32; wo] irq_global_clear,
    }
}

// ---------------------------------------------------------------------------
// Per-VFE register block (base = VFE_STRIDE * vfe)
// ---------------------------------------------------------------------------

/// Distance between the VFE0 and VFE1 register blocks.
pub const VFE_STRIDE: u32 = 0x200;

/// Returns the block base for a VFE instance.
#[must_use]
pub const fn vfe_base(vfe: VfeInstance) -> u32 {
    VFE_STRIDE * vfe as u32
}

register_block! {
    /// Per-VFE interrupt, routing and lane registers.
    pub IspifVfeRegs {
        /// Interrupt mask, bank 0.
        [0x208; u32; rw] irq_mask_0,
        /// Interrupt mask, bank 1.
        [0x20C; u32; rw] irq_mask_1,
        /// Interrupt mask, bank 2.
        [0x210; u32; rw] irq_mask_2,
        /// Interrupt status, bank 0.
        [0x21C; u32; ro] irq_status_0 => IrqStatus0,
        /// Interrupt status, bank 1.
        [0x220; u32; ro] irq_status_1 => IrqStatus1,
        /// Interrupt status, bank 2.
        [0x224; u32; ro] irq_status_2 => IrqStatus2,
        /// Interrupt clear, bank 0.
        [0x230; u32; wo] irq_clear_0,
        /// Interrupt clear, bank 1.
        [0x234; u32; wo] irq_clear_1,
        /// Interrupt clear, bank 2.
        [0x238; u32; wo] irq_clear_2,
        /// CSID input select (V3).
        [0x244; u32; rw] input_sel,
        /// Frame-boundary command word for PIX0/PIX1/RDI0/RDI1.
        [0x248; u32; rw] intf_cmd,
        /// Frame-boundary command word for RDI2.
        [0x24C; u32; rw] intf_cmd_1,
        /// PIX0 channel-id enable mask.
        [0x254; u32; rw] pix0_cid_mask,
        /// PIX1 channel-id enable mask.
        [0x258; u32; rw] pix1_cid_mask,
        /// RDI0 channel-id enable mask.
        [0x264; u32; rw] rdi0_cid_mask,
        /// RDI1 channel-id enable mask.
        [0x268; u32; rw] rdi1_cid_mask,
        /// RDI2 channel-id enable mask.
        [0x26C; u32; rw] rdi2_cid_mask,
        /// PIX0 interface status.
        [0x2C0; u32; ro] pix0_status,
        /// PIX1 interface status.
        [0x2C4; u32; ro] pix1_status,
        /// RDI0 interface status.
        [0x2D0; u32; ro] rdi0_status,
        /// RDI1 interface status.
        [0x2D4; u32; ro] rdi1_status,
        /// RDI2 interface status.
        [0x2D8; u32; ro] rdi2_status,
    }
}

impl IspifVfeRegs<'_> {
    /// Reads the channel-id mask register of `lane`.
    #[must_use]
    pub fn cid_mask(&self, lane: InterfaceLane) -> u32 {
        match lane {
            InterfaceLane::Pix0 => self.pix0_cid_mask(),
            InterfaceLane::Rdi0 => self.rdi0_cid_mask(),
            InterfaceLane::Pix1 => self.pix1_cid_mask(),
            InterfaceLane::Rdi1 => self.rdi1_cid_mask(),
            InterfaceLane::Rdi2 => self.rdi2_cid_mask(),
        }
    }

    /// Writes the channel-id mask register of `lane` with a barrier.
    pub fn set_cid_mask_barrier(&self, lane: InterfaceLane, value: u32) {
        match lane {
            InterfaceLane::Pix0 => self.set_pix0_cid_mask_barrier(value),
            InterfaceLane::Rdi0 => self.set_rdi0_cid_mask_barrier(value),
            InterfaceLane::Pix1 => self.set_pix1_cid_mask_barrier(value),
            InterfaceLane::Rdi1 => self.set_rdi1_cid_mask_barrier(value),
            InterfaceLane::Rdi2 => self.set_rdi2_cid_mask_barrier(value),
        }
    }

    /// Reads the interface status register of `lane`.
    #[must_use]
    pub fn lane_status(&self, lane: InterfaceLane) -> u32 {
        match lane {
            InterfaceLane::Pix0 => self.pix0_status(),
            InterfaceLane::Rdi0 => self.rdi0_status(),
            InterfaceLane::Pix1 => self.pix1_status(),
            InterfaceLane::Rdi1 => self.rdi1_status(),
            InterfaceLane::Rdi2 => self.rdi2_status(),
        }
    }

    /// Returns the absolute offset of the status register of `lane`.
    #[must_use]
    pub fn lane_status_offset(&self, lane: InterfaceLane) -> u32 {
        match lane {
            InterfaceLane::Pix0 => self.pix0_status_offset(),
            InterfaceLane::Rdi0 => self.rdi0_status_offset(),
            InterfaceLane::Pix1 => self.pix1_status_offset(),
            InterfaceLane::Rdi1 => self.rdi1_status_offset(),
            InterfaceLane::Rdi2 => self.rdi2_status_offset(),
        }
    }

    /// Returns the absolute offset of the channel-id mask register of `lane`.
    #[must_use]
    pub fn cid_mask_offset(&self, lane: InterfaceLane) -> u32 {
        match lane {
            InterfaceLane::Pix0 => self.pix0_cid_mask_offset(),
            InterfaceLane::Rdi0 => self.rdi0_cid_mask_offset(),
            InterfaceLane::Pix1 => self.pix1_cid_mask_offset(),
            InterfaceLane::Rdi1 => self.rdi1_cid_mask_offset(),
            InterfaceLane::Rdi2 => self.rdi2_cid_mask_offset(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bitflags
// ---------------------------------------------------------------------------

bitflags! {
    /// Reset command register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResetCmd: u32 {
        /// Strobed reset enable; must accompany every strobe.
        const STROBED_RST_EN = 1 << 0;
        /// Miscellaneous logic reset strobe.
        const MISC_LOGIC_RST_STB = 1 << 1;
        /// Software register reset strobe.
        const SW_REG_RST_STB = 1 << 2;
        /// PIX0 CSID-side reset strobe.
        const PIX_0_CSID_RST_STB = 1 << 3;
        /// PIX0 VFE-side reset strobe.
        const PIX_0_VFE_RST_STB = 1 << 4;
        /// PIX1 CSID-side reset strobe.
        const PIX_1_CSID_RST_STB = 1 << 5;
        /// PIX1 VFE-side reset strobe.
        const PIX_1_VFE_RST_STB = 1 << 6;
        /// RDI0 CSID-side reset strobe.
        const RDI_0_CSID_RST_STB = 1 << 7;
        /// RDI0 VFE-side reset strobe.
        const RDI_0_VFE_RST_STB = 1 << 8;
        /// RDI1 CSID-side reset strobe.
        const RDI_1_CSID_RST_STB = 1 << 9;
        /// RDI1 VFE-side reset strobe.
        const RDI_1_VFE_RST_STB = 1 << 10;
        /// RDI2 CSID-side reset strobe.
        const RDI_2_CSID_RST_STB = 1 << 11;
        /// RDI2 VFE-side reset strobe.
        const RDI_2_VFE_RST_STB = 1 << 12;
        /// AHB clock domain reset.
        const AHB_CLK_DOMAIN_RST = 1 << 25;
        /// RDI0 clock domain reset.
        const RDI_CLK_DOMAIN_RST = 1 << 26;
        /// RDI1 clock domain reset.
        const RDI_1_CLK_DOMAIN_RST = 1 << 27;
        /// RDI2 clock domain reset.
        const RDI_2_CLK_DOMAIN_RST = 1 << 28;
        /// PIX0 clock domain reset.
        const PIX_CLK_DOMAIN_RST = 1 << 29;
        /// PIX1 clock domain reset.
        const PIX_1_CLK_DOMAIN_RST = 1 << 30;
        /// VFE clock domain reset.
        const VFE_CLK_DOMAIN_RST = 1 << 31;
        const _ = !0;
    }
}

/// Full reset of the VFE0 bank.
pub const RST_CMD_MASK: ResetCmd = ResetCmd::from_bits_retain(0xFE0F_1FFF);
/// Full reset of the VFE1 bank.
pub const RST_CMD_1_MASK: ResetCmd = ResetCmd::from_bits_retain(0xFC0F_1FF9);

bitflags! {
    /// Interrupt status bank 0 flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqStatus0: u32 {
        /// PIX0 start-of-frame events.
        const PIX0_SOF = 0x0000_0249;
        /// PIX0 overflow.
        const PIX0_OVERFLOW = 1 << 12;
        /// RDI0 start-of-frame events.
        const RDI0_SOF = 0x0049_2000;
        /// RDI0 overflow.
        const RDI0_OVERFLOW = 1 << 25;
        /// Reset completed.
        const RESET_DONE = 1 << 27;
        const _ = !0;
    }
}

bitflags! {
    /// Interrupt status bank 1 flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqStatus1: u32 {
        /// RDI1 start-of-frame events.
        const RDI1_SOF = 0x0049_2000;
        /// RDI1 overflow.
        const RDI1_OVERFLOW = 1 << 25;
        const _ = !0;
    }
}

bitflags! {
    /// Interrupt status bank 2 flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqStatus2: u32 {
        /// RDI2 start-of-frame events.
        const RDI2_SOF = 0x0000_0249;
        /// RDI2 overflow.
        const RDI2_OVERFLOW = 1 << 12;
        const _ = !0;
    }
}

/// Defined interrupt sources of bank 0.
pub const IRQ_STATUS_0_MASK: u32 = 0x0A49_3249;
/// Defined interrupt sources of bank 1.
pub const IRQ_STATUS_1_MASK: u32 = 0x0249_3249;
/// Defined interrupt sources of bank 2.
pub const IRQ_STATUS_2_MASK: u32 = 0x0000_1249;

/// Value written to the global clear register to latch the clears.
pub const IRQ_GLOBAL_CLEAR_CMD: u32 = 0x1;

/// Lane status bits that all read set when the lane is idle.
pub const LANE_IDLE_MASK: u32 = 0xF;

/// Start of the diagnostic register window.
pub const DUMP_START: u32 = 0x100;
/// Length in bytes of the diagnostic register window.
pub const DUMP_LEN: u32 = 0x250;

/// Returns `true` if a lane status word reports idle.
#[must_use]
pub const fn lane_is_idle(status: u32) -> bool {
    status & LANE_IDLE_MASK == LANE_IDLE_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vfe_bases() {
        assert_eq!(vfe_base(VfeInstance::Vfe0), 0);
        assert_eq!(vfe_base(VfeInstance::Vfe1), 0x200);
    }

    #[test]
    fn reset_masks_cover_every_lane_strobe() {
        let strobes = ResetCmd::PIX_0_CSID_RST_STB
            | ResetCmd::PIX_0_VFE_RST_STB
            | ResetCmd::PIX_1_CSID_RST_STB
            | ResetCmd::PIX_1_VFE_RST_STB
            | ResetCmd::RDI_0_CSID_RST_STB
            | ResetCmd::RDI_0_VFE_RST_STB
            | ResetCmd::RDI_1_CSID_RST_STB
            | ResetCmd::RDI_1_VFE_RST_STB
            | ResetCmd::RDI_2_CSID_RST_STB
            | ResetCmd::RDI_2_VFE_RST_STB;
        assert!(RST_CMD_MASK.contains(strobes | ResetCmd::STROBED_RST_EN));
    }

    #[test]
    fn status_masks_include_reported_bits() {
        let s0 = IrqStatus0::PIX0_SOF
            | IrqStatus0::PIX0_OVERFLOW
            | IrqStatus0::RDI0_SOF
            | IrqStatus0::RDI0_OVERFLOW
            | IrqStatus0::RESET_DONE;
        assert_eq!(s0.bits() & !IRQ_STATUS_0_MASK, 0);
        let s1 = IrqStatus1::RDI1_SOF | IrqStatus1::RDI1_OVERFLOW;
        assert_eq!(s1.bits() & !IRQ_STATUS_1_MASK, 0);
        let s2 = IrqStatus2::RDI2_SOF | IrqStatus2::RDI2_OVERFLOW;
        assert_eq!(s2.bits() & !IRQ_STATUS_2_MASK, 0);
    }

    #[test]
    fn idle_requires_all_four_bits() {
        assert!(lane_is_idle(0xF));
        assert!(lane_is_idle(0x1F));
        assert!(!lane_is_idle(0x7));
        assert!(!lane_is_idle(0));
    }

    #[test]
    fn dump_window_ends_at_0x350() {
        assert_eq!(DUMP_START + DUMP_LEN, 0x350);
    }
}
