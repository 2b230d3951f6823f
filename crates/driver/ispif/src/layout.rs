//! Per-version and per-lane hardware tables.
//!
//! Everything that differs between protocol versions or between lanes is
//! captured here as static data, selected once at init and then consulted
//! by the protocol code instead of branching on the version everywhere.

use ispif_core::{InterfaceLane, ProtocolVersion, VfeInstance};

use crate::regs::{IrqStatus0, IrqStatus1, IrqStatus2, ResetCmd};

// ---------------------------------------------------------------------------
// Version profiles
// ---------------------------------------------------------------------------

/// How a lane's CSID source is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsidSelect {
    /// The lane clock rate encodes the CSID index (V1/V2).
    ClockRate,
    /// A 2-bit field in the VFE's input-select register (V3).
    InputSelect,
}

/// Static description of one protocol version.
#[derive(Debug)]
pub struct VersionProfile {
    /// The version this profile describes.
    pub version: ProtocolVersion,
    /// Clocks enabled at init, in lane-index order for clock-rate selection.
    pub clocks: &'static [&'static str],
    /// CSID selection mechanism.
    pub csid_select: CsidSelect,
    /// Whether VFE1 and the secondary reset/interrupt bank exist.
    pub dual_vfe: bool,
    /// Number of selectable CSID cores.
    pub csid_count: u8,
    /// Lanes that can be routed.
    pub lanes: &'static [InterfaceLane],
}

const CSI_CLOCKS: [&str; 5] = [
    "csi_pix_clk",
    "csi_rdi_clk",
    "csi_pix1_clk",
    "csi_rdi1_clk",
    "csi_rdi2_clk",
];

const CAMSS_CLOCKS: [&str; 4] = [
    "camss_vfe_vfe_clk",
    "camss_csi_vfe_clk",
    "camss_vfe_vfe_clk1",
    "camss_csi_vfe_clk1",
];

static V1_PROFILE: VersionProfile = VersionProfile {
    version: ProtocolVersion::V1,
    clocks: &["csi_pix_clk", "csi_rdi_clk"],
    csid_select: CsidSelect::ClockRate,
    dual_vfe: false,
    csid_count: 3,
    lanes: &[InterfaceLane::Pix0, InterfaceLane::Rdi0],
};

static V2_PROFILE: VersionProfile = VersionProfile {
    version: ProtocolVersion::V2,
    clocks: &CSI_CLOCKS,
    csid_select: CsidSelect::ClockRate,
    dual_vfe: false,
    csid_count: 3,
    lanes: &InterfaceLane::ALL,
};

static V3_PROFILE: VersionProfile = VersionProfile {
    version: ProtocolVersion::V3,
    clocks: &CAMSS_CLOCKS,
    csid_select: CsidSelect::InputSelect,
    dual_vfe: true,
    csid_count: 4,
    lanes: &InterfaceLane::ALL,
};

impl VersionProfile {
    /// Returns the profile of `version`.
    #[must_use]
    pub fn get(version: ProtocolVersion) -> &'static Self {
        match version {
            ProtocolVersion::V1 => &V1_PROFILE,
            ProtocolVersion::V2 => &V2_PROFILE,
            ProtocolVersion::V3 => &V3_PROFILE,
        }
    }

    /// Returns `true` if `vfe` exists on this version.
    #[must_use]
    pub fn supports_vfe(&self, vfe: VfeInstance) -> bool {
        vfe == VfeInstance::Vfe0 || self.dual_vfe
    }

    /// Returns `true` if `lane` can be routed on this version.
    #[must_use]
    pub fn supports_lane(&self, lane: InterfaceLane) -> bool {
        self.lanes.contains(&lane)
    }

    /// Returns `true` if `csid` names an existing CSID core.
    #[must_use]
    pub fn supports_csid(&self, csid: u8) -> bool {
        csid < self.csid_count
    }

    /// Returns the clock whose rate selects the CSID source of `lane`.
    ///
    /// `None` when the version selects by register field, or when the
    /// lane's clock is not part of the enabled set.
    #[must_use]
    pub fn lane_clock(&self, lane: InterfaceLane) -> Option<&'static str> {
        match self.csid_select {
            CsidSelect::ClockRate => self.clocks.get(lane.index()).copied(),
            CsidSelect::InputSelect => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Lane table
// ---------------------------------------------------------------------------

/// An interrupt condition: a status bank and the bits that report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqSource {
    /// Bits in status bank 0.
    Bank0(IrqStatus0),
    /// Bits in status bank 1.
    Bank1(IrqStatus1),
    /// Bits in status bank 2.
    Bank2(IrqStatus2),
}

impl IrqSource {
    /// Returns the index of the status bank.
    #[must_use]
    pub const fn bank(self) -> usize {
        match self {
            Self::Bank0(_) => 0,
            Self::Bank1(_) => 1,
            Self::Bank2(_) => 2,
        }
    }

    /// Returns the raw status bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bank0(bits) => bits.bits(),
            Self::Bank1(bits) => bits.bits(),
            Self::Bank2(bits) => bits.bits(),
        }
    }

    /// Returns `true` if any of the source's bits are set in the drained
    /// status words.
    #[must_use]
    pub const fn is_set(self, status: [u32; 3]) -> bool {
        status[self.bank()] & self.bits() != 0
    }
}

/// Static description of one interface lane.
#[derive(Debug)]
pub struct LaneInfo {
    /// VFE-side and CSID-side reset strobes.
    pub reset: ResetCmd,
    /// Bit offset of the lane's 2-bit field in the input-select register.
    pub input_sel_shift: u32,
    /// Start-of-frame interrupt, if the lane reports one.
    pub sof: Option<IrqSource>,
    /// Overflow interrupt, if the lane reports one.
    pub overflow: Option<IrqSource>,
}

static LANES: [LaneInfo; InterfaceLane::COUNT] = [
    // PIX0
    LaneInfo {
        reset: ResetCmd::PIX_0_VFE_RST_STB.union(ResetCmd::PIX_0_CSID_RST_STB),
        input_sel_shift: 0,
        sof: Some(IrqSource::Bank0(IrqStatus0::PIX0_SOF)),
        overflow: Some(IrqSource::Bank0(IrqStatus0::PIX0_OVERFLOW)),
    },
    // RDI0
    LaneInfo {
        reset: ResetCmd::RDI_0_VFE_RST_STB.union(ResetCmd::RDI_0_CSID_RST_STB),
        input_sel_shift: 4,
        sof: Some(IrqSource::Bank0(IrqStatus0::RDI0_SOF)),
        overflow: Some(IrqSource::Bank0(IrqStatus0::RDI0_OVERFLOW)),
    },
    // PIX1
    LaneInfo {
        reset: ResetCmd::PIX_1_VFE_RST_STB.union(ResetCmd::PIX_1_CSID_RST_STB),
        input_sel_shift: 8,
        sof: None,
        overflow: None,
    },
    // RDI1
    LaneInfo {
        reset: ResetCmd::RDI_1_VFE_RST_STB.union(ResetCmd::RDI_1_CSID_RST_STB),
        input_sel_shift: 12,
        sof: Some(IrqSource::Bank1(IrqStatus1::RDI1_SOF)),
        overflow: Some(IrqSource::Bank1(IrqStatus1::RDI1_OVERFLOW)),
    },
    // RDI2
    LaneInfo {
        reset: ResetCmd::RDI_2_VFE_RST_STB.union(ResetCmd::RDI_2_CSID_RST_STB),
        input_sel_shift: 20,
        sof: Some(IrqSource::Bank2(IrqStatus2::RDI2_SOF)),
        overflow: Some(IrqSource::Bank2(IrqStatus2::RDI2_OVERFLOW)),
    },
];

/// Returns the static description of `lane`.
#[must_use]
pub fn lane_info(lane: InterfaceLane) -> &'static LaneInfo {
    &LANES[lane.index()]
}
