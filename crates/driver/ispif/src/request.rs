//! Routing requests carried by the CONFIGURE and frame-boundary commands.

use ispif_core::{ChannelSet, InterfaceLane, VfeInstance};

use crate::error::IspifError;

/// Routing of one lane: which CSID feeds it and which channels it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingEntry {
    /// The lane being routed.
    pub lane: InterfaceLane,
    /// Index of the CSID core feeding the lane.
    pub csid_source: u8,
    /// Virtual channels enabled on the lane.
    pub channels: ChannelSet,
}

impl RoutingEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(lane: InterfaceLane, csid_source: u8, channels: ChannelSet) -> Self {
        Self {
            lane,
            csid_source,
            channels,
        }
    }
}

/// A set of routing entries targeting one VFE instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRequest {
    /// The VFE instance the entries apply to.
    pub vfe: VfeInstance,
    /// Entries, applied in order.
    pub entries: Vec<RoutingEntry>,
}

impl RoutingRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(vfe: VfeInstance, entries: Vec<RoutingEntry>) -> Self {
        Self { vfe, entries }
    }

    /// Checks the structural invariants: every entry names at least one
    /// channel and no lane appears twice.
    ///
    /// # Errors
    ///
    /// Returns [`IspifError::InvalidRequest`] on the first violation.
    pub fn validate(&self) -> Result<(), IspifError> {
        let mut seen = [false; InterfaceLane::COUNT];
        for entry in &self.entries {
            if entry.channels.is_empty() {
                return Err(IspifError::InvalidRequest("entry without channels"));
            }
            let slot = &mut seen[entry.lane.index()];
            if *slot {
                return Err(IspifError::InvalidRequest("lane listed twice"));
            }
            *slot = true;
        }
        Ok(())
    }

    /// Returns the lanes named by the request, in entry order.
    pub fn lanes(&self) -> impl Iterator<Item = InterfaceLane> + '_ {
        self.entries.iter().map(|e| e.lane)
    }
}
