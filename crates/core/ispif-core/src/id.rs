//! Type-safe identifiers for ISPIF resources.
//!
//! These types prevent accidental mixing of lane numbers, VFE indices and
//! virtual channel ids, which all travel as small integers on the wire.

use core::fmt;

/// One of the five physical data lanes of a VFE instance.
///
/// Discriminants follow the hardware numbering, which also indexes the
/// per-lane clock table on V1/V2 parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum InterfaceLane {
    /// Pixel interface 0.
    Pix0 = 0,
    /// Raw dump interface 0.
    Rdi0 = 1,
    /// Pixel interface 1.
    Pix1 = 2,
    /// Raw dump interface 1.
    Rdi1 = 3,
    /// Raw dump interface 2.
    Rdi2 = 4,
}

impl InterfaceLane {
    /// Number of lanes per VFE instance.
    pub const COUNT: usize = 5;

    /// All lanes in hardware order.
    pub const ALL: [Self; Self::COUNT] = [Self::Pix0, Self::Rdi0, Self::Pix1, Self::Rdi1, Self::Rdi2];

    /// Returns the hardware index of the lane.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Converts a raw hardware index into a lane.
    #[must_use]
    pub const fn from_index(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Pix0),
            1 => Some(Self::Rdi0),
            2 => Some(Self::Pix1),
            3 => Some(Self::Rdi1),
            4 => Some(Self::Rdi2),
            _ => None,
        }
    }

    /// Returns the lowercase short name used in logs (`pix0`, `rdi2`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pix0 => "pix0",
            Self::Rdi0 => "rdi0",
            Self::Pix1 => "pix1",
            Self::Rdi1 => "rdi1",
            Self::Rdi2 => "rdi2",
        }
    }

    /// Looks a lane up by its short name, as printed by [`name`](Self::name).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lane| lane.name() == name)
    }
}

impl fmt::Display for InterfaceLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A downstream image-processing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum VfeInstance {
    /// The primary VFE, present on every version.
    Vfe0 = 0,
    /// The secondary VFE, only present on V3 hardware.
    Vfe1 = 1,
}

impl VfeInstance {
    /// Number of VFE instances the controller tracks.
    pub const COUNT: usize = 2;

    /// Both instances in index order.
    pub const ALL: [Self; Self::COUNT] = [Self::Vfe0, Self::Vfe1];

    /// Returns the index of the instance.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Converts a raw index into a VFE instance.
    #[must_use]
    pub const fn from_index(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Vfe0),
            1 => Some(Self::Vfe1),
            _ => None,
        }
    }
}

impl fmt::Display for VfeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vfe{}", self.index())
    }
}

/// CSID protocol generation the controller is driven with.
///
/// Ordered: later versions are strictly more capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    /// First generation: two clocks, CSID selected by clock rate.
    V1,
    /// Second generation: per-lane clocks, CSID selected by clock rate.
    V2,
    /// Third generation: dual VFE, CSID selected by register field.
    V3,
}

impl ProtocolVersion {
    /// Decodes the raw version code carried by the INIT command.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            _ => None,
        }
    }

    /// Returns the raw version code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.code())
    }
}

/// A virtual-channel identifier in `[0, 31]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChannelId(u8);

impl ChannelId {
    /// Largest valid channel id.
    pub const MAX: u8 = 31;

    /// Creates a channel id, returning `None` if `raw` exceeds [`Self::MAX`].
    #[must_use]
    pub const fn new(raw: u8) -> Option<Self> {
        if raw <= Self::MAX { Some(Self(raw)) } else { None }
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Returns the virtual channel used for command-bit placement.
    #[must_use]
    pub const fn vc(self) -> u32 {
        (self.0 % 4) as u32
    }

    /// Returns the bit this channel occupies in a CID mask register.
    #[must_use]
    pub const fn mask_bit(self) -> u32 {
        1 << self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of channel ids, stored as the CID-mask bit pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ChannelSet(u32);

impl ChannelSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Creates a set from a raw CID mask.
    #[must_use]
    pub const fn from_mask(mask: u32) -> Self {
        Self(mask)
    }

    /// Returns the CID mask.
    #[must_use]
    pub const fn mask(self) -> u32 {
        self.0
    }

    /// Returns `true` if the set holds no channels.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of channels in the set.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns `true` if `id` is in the set.
    #[must_use]
    pub const fn contains(self, id: ChannelId) -> bool {
        self.0 & id.mask_bit() != 0
    }

    /// Adds `id` to the set.
    pub fn insert(&mut self, id: ChannelId) {
        self.0 |= id.mask_bit();
    }

    /// Iterates the channels in ascending order.
    pub fn iter(self) -> impl Iterator<Item = ChannelId> {
        (0..=ChannelId::MAX)
            .filter(move |bit| self.0 & (1 << bit) != 0)
            .map(ChannelId)
    }
}

impl FromIterator<ChannelId> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = ChannelId>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for id in iter {
            set.insert(id);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_index_roundtrip() {
        for lane in InterfaceLane::ALL {
            assert_eq!(InterfaceLane::from_index(lane.index() as u8), Some(lane));
        }
        assert_eq!(InterfaceLane::from_index(5), None);
    }

    #[test]
    fn lane_display() {
        assert_eq!(format!("{}", InterfaceLane::Rdi2), "rdi2");
        assert_eq!(InterfaceLane::from_name("pix1"), Some(InterfaceLane::Pix1));
        assert_eq!(InterfaceLane::from_name("PIX1"), None);
    }

    #[test]
    fn vfe_from_index() {
        assert_eq!(VfeInstance::from_index(1), Some(VfeInstance::Vfe1));
        assert_eq!(VfeInstance::from_index(2), None);
        assert_eq!(format!("{}", VfeInstance::Vfe1), "vfe1");
    }

    #[test]
    fn version_ordering() {
        assert!(ProtocolVersion::V1 < ProtocolVersion::V2);
        assert!(ProtocolVersion::V2 < ProtocolVersion::V3);
    }

    #[test]
    fn version_codes() {
        assert_eq!(ProtocolVersion::from_code(3), Some(ProtocolVersion::V3));
        assert_eq!(ProtocolVersion::from_code(0), None);
        assert_eq!(ProtocolVersion::from_code(4), None);
        assert_eq!(ProtocolVersion::V2.code(), 2);
    }

    #[test]
    fn channel_bounds() {
        assert!(ChannelId::new(31).is_some());
        assert!(ChannelId::new(32).is_none());
    }

    #[test]
    fn channel_vc_wraps_mod_four() {
        assert_eq!(ChannelId::new(5).unwrap().vc(), 1);
        assert_eq!(ChannelId::new(31).unwrap().vc(), 3);
        assert_eq!(ChannelId::new(31).unwrap().mask_bit(), 0x8000_0000);
    }

    #[test]
    fn channel_set_collects_and_iterates() {
        let set: ChannelSet = [2u8, 5, 2]
            .into_iter()
            .filter_map(ChannelId::new)
            .collect();
        assert_eq!(set.mask(), 0b10_0100);
        assert_eq!(set.len(), 2);
        let ids: Vec<u8> = set.iter().map(ChannelId::as_u8).collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn channel_set_empty() {
        assert!(ChannelSet::EMPTY.is_empty());
        assert_eq!(ChannelSet::EMPTY.iter().count(), 0);
    }
}
