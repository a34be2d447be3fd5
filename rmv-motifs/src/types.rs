//! Core types and the source trait
//!
//! Every source adapter normalizes its native format into the types here:
//! - [`ResidueSpec`] - one nucleotide position (chain + author number)
//! - [`MotifInstance`] - one motif call with ordered residues and metadata
//! - [`MotifCollection`] - category → instances, the unit passed between stages
//!
//! # Identity
//! Merging and enrichment compare motifs only by their residue-identity set
//! (chain, residue number). Nucleotide letter and model are carried for
//! display but never participate in identity.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Residues
// ============================================================================

/// Residue identity key: (chain, residue number)
pub type ResidueKey = (String, i32);

/// Single residue position within a structure
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResidueSpec {
    /// Chain identifier (author chain)
    pub chain: String,
    /// Author residue number (may be negative)
    pub residue_number: i32,
    /// Nucleotide letter ('N' when unknown)
    pub nucleotide: char,
    /// Model number
    pub model: u32,
}

impl ResidueSpec {
    /// Unknown nucleotide placeholder
    pub const UNKNOWN_NUCLEOTIDE: char = 'N';

    /// Create residue in model 1 with an unknown nucleotide
    pub fn new(chain: impl Into<String>, residue_number: i32) -> Self {
        Self {
            chain: chain.into(),
            residue_number,
            nucleotide: Self::UNKNOWN_NUCLEOTIDE,
            model: 1,
        }
    }

    /// Set nucleotide letter
    pub fn with_nucleotide(mut self, nucleotide: char) -> Self {
        self.nucleotide = nucleotide;
        self
    }

    /// Set model number
    pub fn with_model(mut self, model: u32) -> Self {
        self.model = model;
        self
    }

    /// Identity key used by merging and enrichment
    pub fn key(&self) -> ResidueKey {
        (self.chain.clone(), self.residue_number)
    }
}

/// Longest residue range a single record may describe
///
/// Larger than any RNA chain in the PDB; a span beyond it is a corrupt record.
pub const MAX_RANGE_SPAN: i64 = 10_000;

/// Expand an inclusive residue range on one chain
///
/// Nucleotides are taken from `sequence` by offset from `start`; positions
/// past the end of the sequence get 'N'. An inverted range yields nothing.
/// A span above [`MAX_RANGE_SPAN`] is rejected before allocating.
pub fn expand_range(
    chain: &str,
    start: i32,
    end: i32,
    sequence: Option<&str>,
) -> Result<Vec<ResidueSpec>, RecordError> {
    if end < start {
        return Ok(Vec::new());
    }
    if i64::from(end) - i64::from(start) + 1 > MAX_RANGE_SPAN {
        return Err(RecordError::RangeTooLong { start, end });
    }
    let letters: Vec<char> = sequence.map(|s| s.chars().collect()).unwrap_or_default();
    Ok((start..=end)
        .enumerate()
        .map(|(offset, number)| {
            let nucleotide = letters
                .get(offset)
                .copied()
                .unwrap_or(ResidueSpec::UNKNOWN_NUCLEOTIDE);
            ResidueSpec::new(chain, number).with_nucleotide(nucleotide)
        })
        .collect())
}

// ============================================================================
// Metadata
// ============================================================================

/// Well-known metadata keys
pub mod meta {
    pub const SOURCE: &str = "source";
    pub const LOOP_TYPE: &str = "loop_type";
    pub const MOTIF_GROUP: &str = "motif_group";
    pub const P_VALUE: &str = "p_value";
    pub const ALIGNMENT_SCORE: &str = "alignment_score";
    pub const REGIONS: &str = "regions";
    pub const ALIGNED_REGIONS: &str = "aligned_regions";
    pub const FRAGMENT_ID: &str = "fragment_id";
    pub const CHAIN: &str = "chain";
    pub const POSITIONS: &str = "positions";
    pub const SEQUENCE_LENGTH: &str = "sequence_length";
    pub const RESIDUE_COUNT: &str = "residue_count";
    pub const MOTIF_ACC: &str = "motif_acc";
    pub const SCORE: &str = "score";
    pub const ENRICHED_FROM: &str = "enriched_from";
    pub const ENRICHMENT_SOURCE: &str = "enrichment_source";
}

/// Metadata value attached to a motif instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Free text
    Text(String),
    /// Integer count or identifier
    Integer(i64),
    /// Floating point measurement (score, p-value)
    Number(f64),
    /// Residue-number ranges on an implied chain
    Ranges(Vec<(i32, i32)>),
    /// Chain-qualified residue ranges
    Regions(Vec<(String, i32, i32)>),
}

impl MetadataValue {
    /// Numeric view (integers widen to f64)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Number(n) => Some(*n),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        MetadataValue::Number(n)
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Integer(i)
    }
}

impl From<usize> for MetadataValue {
    fn from(i: usize) -> Self {
        MetadataValue::Integer(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

/// Ordered open metadata map
pub type Metadata = BTreeMap<String, MetadataValue>;

// ============================================================================
// Motif instances
// ============================================================================

/// One motif call within a structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifInstance {
    /// Source-unique instance identifier
    pub instance_id: String,
    /// Category name (e.g. "HL", "Kink-turn")
    pub motif_id: String,
    /// Structure the instance belongs to (upper-case)
    pub pdb_id: String,
    /// Residues in source order
    pub residues: Vec<ResidueSpec>,
    /// Human-readable annotation (defaults to the category)
    pub annotation: String,
    /// Source-specific metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl MotifInstance {
    /// Create instance whose annotation defaults to the category
    pub fn new(
        instance_id: impl Into<String>,
        motif_id: impl Into<String>,
        pdb_id: impl Into<String>,
        residues: Vec<ResidueSpec>,
    ) -> Self {
        let motif_id = motif_id.into();
        Self {
            instance_id: instance_id.into(),
            annotation: motif_id.clone(),
            motif_id,
            pdb_id: pdb_id.into(),
            residues,
            metadata: Metadata::new(),
        }
    }

    /// Replace annotation
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    /// Insert one metadata entry
    pub fn with_meta(mut self, key: &str, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// P-value, if the source reported one
    pub fn p_value(&self) -> Option<f64> {
        self.metadata.get(meta::P_VALUE).and_then(MetadataValue::as_f64)
    }

    /// Alignment score, if the source reported one
    pub fn alignment_score(&self) -> Option<f64> {
        self.metadata
            .get(meta::ALIGNMENT_SCORE)
            .and_then(MetadataValue::as_f64)
    }

    /// Motif-group identifier (non-empty only)
    pub fn motif_group(&self) -> Option<&str> {
        self.metadata
            .get(meta::MOTIF_GROUP)
            .and_then(MetadataValue::as_str)
            .filter(|g| !g.is_empty())
    }

    /// Distinct chains in residue order
    pub fn chains(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.residues
            .iter()
            .map(|r| r.chain.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Residue-identity set
    pub fn residue_key_set(&self) -> HashSet<ResidueKey> {
        self.residues.iter().map(ResidueSpec::key).collect()
    }

    /// Residue numbers on one chain
    pub fn residue_numbers_on_chain(&self, chain: &str) -> HashSet<i32> {
        self.residues
            .iter()
            .filter(|r| r.chain == chain)
            .map(|r| r.residue_number)
            .collect()
    }
}

// ============================================================================
// Collections
// ============================================================================

/// Category → instances
///
/// Categories are kept in sorted order; instance order within a category is
/// whatever the producing stage emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotifCollection(BTreeMap<String, Vec<MotifInstance>>);

impl MotifCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one instance under a category
    pub fn insert_instance(&mut self, category: impl Into<String>, instance: MotifInstance) {
        self.0.entry(category.into()).or_default().push(instance);
    }

    /// Append many instances under a category (no-op for an empty list)
    pub fn extend_category(&mut self, category: impl Into<String>, instances: Vec<MotifInstance>) {
        if instances.is_empty() {
            return;
        }
        self.0.entry(category.into()).or_default().extend(instances);
    }

    /// Instances for a category
    pub fn get(&self, category: &str) -> Option<&[MotifInstance]> {
        self.0.get(category).map(Vec::as_slice)
    }

    /// Iterate categories with their instances
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<MotifInstance>)> {
        self.0.iter()
    }

    /// Iterate every instance across categories
    pub fn instances(&self) -> impl Iterator<Item = &MotifInstance> {
        self.0.values().flatten()
    }

    /// Category names
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of categories
    pub fn category_count(&self) -> usize {
        self.0.len()
    }

    /// Number of instances across all categories
    pub fn total_instances(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// True when the collection holds no instances
    pub fn is_empty(&self) -> bool {
        self.total_instances() == 0
    }

    /// Instance count per category
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.0.iter().map(|(k, v)| (k.clone(), v.len())).collect()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<MotifInstance>> {
        self.0
    }
}

impl From<BTreeMap<String, Vec<MotifInstance>>> for MotifCollection {
    fn from(map: BTreeMap<String, Vec<MotifInstance>>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Vec<MotifInstance>)> for MotifCollection {
    fn from_iter<I: IntoIterator<Item = (String, Vec<MotifInstance>)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (category, instances) in iter {
            collection.extend_category(category, instances);
        }
        collection
    }
}

impl IntoIterator for MotifCollection {
    type Item = (String, Vec<MotifInstance>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<MotifInstance>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ============================================================================
// Structure identifiers
// ============================================================================

/// Validated 4-character structure identifier, stored upper-case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StructureId(String);

impl StructureId {
    /// Parse and normalize a structure id (case-insensitive)
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        let trimmed = raw.trim();
        if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(SourceError::InvalidStructureId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-case form (user-tool file names)
    pub fn to_lowercase(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for StructureId {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Whole-source failure
#[derive(Debug, Error)]
pub enum SourceError {
    /// Structure or file unknown to the source (HTTP 404, missing file)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Connection, timeout or transport failure
    #[error("Source unreachable: {0}")]
    Unreachable(String),

    /// Non-success HTTP status other than 404
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// I/O error (file read)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Whole-document parse failure
    #[error("Parse error: {0}")]
    Parse(String),

    /// Structure id is not 4 alphanumeric characters
    #[error("Invalid structure id: {0:?}")]
    InvalidStructureId(String),

    /// Internal failure (client construction, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Single-record parse failure; the record is skipped, the file is not
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    /// Too few delimited fields
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },

    /// Required field missing or empty
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Field present but malformed
    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Record parsed but yielded no residues
    #[error("record has no residues")]
    NoResidues,

    /// Residue range wider than [`MAX_RANGE_SPAN`]
    #[error("residue range {start}-{end} exceeds {max} residues", max = MAX_RANGE_SPAN)]
    RangeTooLong { start: i32, end: i32 },
}

impl RecordError {
    pub(crate) fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        RecordError::InvalidField {
            field,
            value: value.into(),
        }
    }
}

// ============================================================================
// Source trait
// ============================================================================

/// Motif data source
///
/// Implementations normalize one native format into a [`MotifCollection`].
/// A structure the source does not know yields `Ok` with an empty
/// collection; errors are reserved for sources that could not be consulted.
#[async_trait::async_trait]
pub trait MotifSource: Send + Sync {
    /// Source name for provenance and logging
    fn name(&self) -> &'static str;

    /// Fetch every motif the source reports for a structure
    async fn get_motifs_for_structure(
        &self,
        structure: &StructureId,
    ) -> Result<MotifCollection, SourceError>;
}
