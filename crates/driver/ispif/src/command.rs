//! Frame-boundary command composition.
//!
//! Each (lane, virtual channel) pair owns a 2-bit field in one of two
//! per-VFE command words. RDI2 lives in the secondary word at
//! `vc * 2 + 8`; every other lane lives in the primary word at
//! `vc * 2 + vfe * 8`. The controller keeps the last composed words in
//! memory and only ever read-modify-writes them there, since the hardware
//! registers are not read back.

use ispif_core::{ChannelId, InterfaceLane, VfeInstance};

use crate::regs::IspifVfeRegs;
use crate::request::RoutingRequest;

/// A 2-bit frame-boundary command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FrameCommand {
    /// Stop the lane at the next frame boundary.
    DisableAtBoundary = 0b00,
    /// Start the lane at the next frame boundary.
    EnableAtBoundary = 0b01,
    /// Stop the lane without waiting for a frame boundary.
    DisableImmediately = 0b10,
}

impl FrameCommand {
    /// Returns the field encoding.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// Which of the two command words a field lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandWord {
    /// `intf_cmd`: PIX0, RDI0, PIX1 and RDI1.
    Primary,
    /// `intf_cmd_1`: RDI2.
    Secondary,
}

/// Returns the word and bit offset of the field for `(lane, channel)` on `vfe`.
#[must_use]
pub const fn field(lane: InterfaceLane, channel: ChannelId, vfe: VfeInstance) -> (CommandWord, u32) {
    let vc = channel.vc();
    match lane {
        InterfaceLane::Rdi2 => (CommandWord::Secondary, vc * 2 + 8),
        _ => (CommandWord::Primary, vc * 2 + vfe as u32 * 8),
    }
}

/// Replaces the field of `(lane, channel)` in `word` with `command`.
///
/// `word` must be the word [`field`] selects for `lane`; bits outside the
/// field are preserved.
#[must_use]
pub const fn compose(
    word: u32,
    lane: InterfaceLane,
    channel: ChannelId,
    vfe: VfeInstance,
    command: FrameCommand,
) -> u32 {
    let (_, shift) = field(lane, channel, vfe);
    (word & !(0b11 << shift)) | (command.bits() << shift)
}

/// The last command words composed for one VFE instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedCommand {
    /// Composed `intf_cmd` value.
    pub primary: u32,
    /// Composed `intf_cmd_1` value.
    pub secondary: u32,
}

impl AppliedCommand {
    /// Reset value of both words. A word still holding it is never written.
    pub const SENTINEL: u32 = 0xFFFF_FFFF;

    /// Both words at the sentinel.
    pub const RESET: Self = Self {
        primary: Self::SENTINEL,
        secondary: Self::SENTINEL,
    };

    /// Sets the field of `(lane, channel)` on `vfe` to `command`.
    pub fn set(&mut self, lane: InterfaceLane, channel: ChannelId, vfe: VfeInstance, command: FrameCommand) {
        let word = match field(lane, channel, vfe).0 {
            CommandWord::Primary => &mut self.primary,
            CommandWord::Secondary => &mut self.secondary,
        };
        *word = compose(*word, lane, channel, vfe, command);
    }

    /// Sets the field of every channel of every entry in `request`.
    pub fn apply(&mut self, request: &RoutingRequest, command: FrameCommand) {
        for entry in &request.entries {
            for channel in entry.channels.iter() {
                self.set(entry.lane, channel, request.vfe, command);
            }
        }
    }

    /// Writes every non-sentinel word to `regs` with barrier writes.
    pub fn write(&self, regs: &IspifVfeRegs<'_>) {
        if self.primary != Self::SENTINEL {
            regs.set_intf_cmd_barrier(self.primary);
        }
        if self.secondary != Self::SENTINEL {
            regs.set_intf_cmd_1_barrier(self.secondary);
        }
    }
}

impl Default for AppliedCommand {
    fn default() -> Self {
        Self::RESET
    }
}
