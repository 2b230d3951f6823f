//! Routing files for the `scenario` command.
//!
//! ```toml
//! version = 2
//! vfe = 0
//!
//! [[entry]]
//! lane = "rdi0"
//! csid = 1
//! channels = [2]
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail};
use ispif::{RoutingEntry, RoutingRequest};
use ispif_core::{ChannelId, ChannelSet, InterfaceLane, VfeInstance};
use serde::Deserialize;

/// A routing file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Routes {
    /// Raw version code passed to INIT.
    pub version: u32,
    /// VFE index the entries target.
    #[serde(default)]
    pub vfe: u8,
    /// Lane routings.
    #[serde(rename = "entry")]
    pub entries: Vec<EntrySpec>,
}

/// One `[[entry]]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntrySpec {
    /// Lane short name (`pix0`, `rdi1`, ...).
    pub lane: String,
    /// CSID source index.
    pub csid: u8,
    /// Virtual channel ids.
    pub channels: Vec<u8>,
}

impl Routes {
    /// Loads a routing file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// RDI0 fed by CSID1 carrying channel 2, on a V2 part.
    pub fn builtin() -> Self {
        Self {
            version: 2,
            vfe: 0,
            entries: vec![EntrySpec {
                lane: "rdi0".into(),
                csid: 1,
                channels: vec![2],
            }],
        }
    }

    /// Converts the file into a controller request.
    pub fn request(&self) -> Result<RoutingRequest> {
        let Some(vfe) = VfeInstance::from_index(self.vfe) else {
            bail!("no VFE {}", self.vfe);
        };
        let entries = self
            .entries
            .iter()
            .map(EntrySpec::to_entry)
            .collect::<Result<Vec<_>>>()?;
        Ok(RoutingRequest::new(vfe, entries))
    }
}

impl EntrySpec {
    fn to_entry(&self) -> Result<RoutingEntry> {
        let lane = parse_lane(&self.lane)?;
        let channels = parse_channels(&self.channels)?;
        Ok(RoutingEntry::new(lane, self.csid, channels))
    }
}

/// Parses a lane short name.
pub fn parse_lane(name: &str) -> Result<InterfaceLane> {
    InterfaceLane::from_name(name).with_context(|| format!("Unknown lane '{name}'"))
}

/// Parses a list of channel ids.
pub fn parse_channels(ids: &[u8]) -> Result<ChannelSet> {
    ids.iter()
        .map(|&id| ChannelId::new(id).with_context(|| format!("Channel {id} out of range")))
        .collect()
}
