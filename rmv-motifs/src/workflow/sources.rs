//! Source registry
//!
//! Numeric ids, display names and classification for every source the
//! pipeline can query. Selection order is merge priority (first wins).

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Where a source's data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Web,
    User,
}

/// Registered motif source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SourceId {
    Atlas,
    RfamLocal,
    BgsuApi,
    RfamApi,
    Fr3d,
    RnaMotifScan,
    RnaMotifScanX,
}

impl SourceId {
    pub const ALL: [SourceId; 7] = [
        SourceId::Atlas,
        SourceId::RfamLocal,
        SourceId::BgsuApi,
        SourceId::RfamApi,
        SourceId::Fr3d,
        SourceId::RnaMotifScan,
        SourceId::RnaMotifScanX,
    ];

    /// Numeric id (1-7)
    pub fn id(&self) -> u8 {
        match self {
            SourceId::Atlas => 1,
            SourceId::RfamLocal => 2,
            SourceId::BgsuApi => 3,
            SourceId::RfamApi => 4,
            SourceId::Fr3d => 5,
            SourceId::RnaMotifScan => 6,
            SourceId::RnaMotifScanX => 7,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceId::Atlas => "RNA 3D Motif Atlas",
            SourceId::RfamLocal => "Rfam (local)",
            SourceId::BgsuApi => "BGSU RNA 3D Hub",
            SourceId::RfamApi => "Rfam API",
            SourceId::Fr3d => "FR3D",
            SourceId::RnaMotifScan => "RNAMotifScan",
            SourceId::RnaMotifScanX => "RNAMotifScanX",
        }
    }

    /// Short name accepted on the command line
    pub fn short_name(&self) -> &'static str {
        match self {
            SourceId::Atlas => "atlas",
            SourceId::RfamLocal => "rfam",
            SourceId::BgsuApi => "bgsu",
            SourceId::RfamApi => "rfam_api",
            SourceId::Fr3d => "fr3d",
            SourceId::RnaMotifScan => "rms",
            SourceId::RnaMotifScanX => "rmsx",
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceId::Atlas | SourceId::RfamLocal => SourceKind::Local,
            SourceId::BgsuApi | SourceId::RfamApi => SourceKind::Web,
            SourceId::Fr3d | SourceId::RnaMotifScan | SourceId::RnaMotifScanX => SourceKind::User,
        }
    }

    /// Categories are loop classes (HL, IL, J3, ...) and need enrichment
    pub fn uses_generic_names(&self) -> bool {
        matches!(self, SourceId::Atlas | SourceId::BgsuApi | SourceId::Fr3d)
    }

    /// Parse a numeric id or a short/display name (case-insensitive)
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if let Ok(id) = token.parse::<u8>() {
            return Self::from_id(id)
                .ok_or_else(|| Error::Config(format!("Unknown source id: {} (valid: 1-7)", id)));
        }
        let lower = token.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|s| s.short_name() == lower || s.display_name().to_lowercase() == lower)
            .ok_or_else(|| Error::Config(format!("Unknown source: {:?}", token)))
    }

    /// Parse a comma/whitespace separated list
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        list.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(Self::parse)
            .collect()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Reject empty selections and repeated sources
pub fn validate_selection(selection: &[SourceId]) -> Result<()> {
    if selection.is_empty() {
        return Err(Error::Config("No sources selected".to_string()));
    }
    let mut seen = HashSet::new();
    for source in selection {
        if !seen.insert(*source) {
            return Err(Error::Config(format!(
                "Source {} ({}) selected more than once",
                source.id(),
                source.display_name()
            )));
        }
    }
    Ok(())
}
