//! Representative-set index (non-redundant equivalence classes)
//!
//! Maps every member chain of a non-redundant equivalence class to the
//! class representative, chain by chain:
//!
//! ```text
//! "NR_all_26150.5","4V9F|1|0","4V9F|1|0,1S72|1|0"
//!   (1S72, "0") → (4V9F, "0", NR_all_26150.5)
//! ```
//!
//! # Multi-chain IFEs
//! An IFE may join several chains with '+'. The i-th member sub-chain maps
//! to the i-th representative sub-chain; surplus member sub-chains map to
//! the representative's first sub-chain.
//!
//! Duplicate (structure, chain) keys resolve to the last row that
//! mentions them. The index is immutable after construction.

use csv::ReaderBuilder;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Representative for one member chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentativeEntry {
    /// Representative structure (upper-case)
    pub rep_structure: String,
    /// Representative chain
    pub rep_chain: String,
    /// Equivalence class identifier
    pub equivalence_class: String,
}

/// (structure, chain) → representative lookup
#[derive(Debug, Clone, Default)]
pub struct RepresentativeIndex {
    /// structure → chain → entry
    by_structure: HashMap<String, BTreeMap<String, RepresentativeEntry>>,
}

impl RepresentativeIndex {
    /// Empty index (no structure has a representative)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from a CSV file; a missing file yields an empty index
    pub fn load(path: &Path) -> Self {
        match std::fs::File::open(path) {
            Ok(file) => {
                let index = Self::from_reader(file);
                info!(
                    path = %path.display(),
                    mappings = index.len(),
                    classes = index.class_count(),
                    "Loaded representative-set index"
                );
                index
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Representative list unavailable; homolog enrichment disabled"
                );
                Self::empty()
            }
        }
    }

    /// Parse from any CSV reader (no header row)
    pub fn from_reader<R: Read>(reader: R) -> Self {
        let mut index = Self::empty();
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        for (row_no, record) in csv_reader.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    debug!(row = row_no + 1, error = %e, "Skipping unreadable representative row");
                    continue;
                }
            };
            if record.len() < 3 {
                debug!(row = row_no + 1, fields = record.len(), "Skipping short representative row");
                continue;
            }
            index.add_row(&record[0], &record[1], &record[2]);
        }

        index
    }

    fn add_row(&mut self, class_id: &str, rep_ife: &str, members: &str) {
        let rep_pairs = parse_ife(rep_ife);
        let Some((first_rep_structure, first_rep_chain)) = rep_pairs.first().cloned() else {
            debug!(class = %class_id, "Skipping row with unparseable representative");
            return;
        };

        for member_ife in members.split(',') {
            for (i, (structure, chain)) in parse_ife(member_ife).into_iter().enumerate() {
                let (rep_structure, rep_chain) = rep_pairs
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| (first_rep_structure.clone(), first_rep_chain.clone()));
                self.by_structure.entry(structure).or_default().insert(
                    chain,
                    RepresentativeEntry {
                        rep_structure,
                        rep_chain,
                        equivalence_class: class_id.to_string(),
                    },
                );
            }
        }
    }

    fn entry(&self, structure: &str, chain: &str) -> Option<&RepresentativeEntry> {
        self.by_structure
            .get(&structure.to_ascii_uppercase())
            .and_then(|chains| chains.get(chain))
    }

    /// Representative (structure, chain) for a member chain
    pub fn get_representative(&self, structure: &str, chain: &str) -> Option<(String, String)> {
        self.entry(structure, chain)
            .map(|e| (e.rep_structure.clone(), e.rep_chain.clone()))
    }

    /// Every mapped chain of a structure → representative (structure, chain)
    pub fn get_all_representatives(&self, structure: &str) -> BTreeMap<String, (String, String)> {
        self.by_structure
            .get(&structure.to_ascii_uppercase())
            .map(|chains| {
                chains
                    .iter()
                    .map(|(chain, e)| (chain.clone(), (e.rep_structure.clone(), e.rep_chain.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when the chain is its own class representative
    pub fn is_self_representative(&self, structure: &str, chain: &str) -> bool {
        self.entry(structure, chain).is_some_and(|e| {
            e.rep_structure.eq_ignore_ascii_case(structure) && e.rep_chain == chain
        })
    }

    /// True when any chain of the structure is listed
    pub fn has_structure(&self, structure: &str) -> bool {
        self.by_structure
            .get(&structure.to_ascii_uppercase())
            .is_some_and(|chains| !chains.is_empty())
    }

    /// Equivalence class id for a member chain
    pub fn equivalence_class(&self, structure: &str, chain: &str) -> Option<&str> {
        self.entry(structure, chain)
            .map(|e| e.equivalence_class.as_str())
    }

    /// Number of (structure, chain) mappings
    pub fn len(&self) -> usize {
        self.by_structure.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn class_count(&self) -> usize {
        let mut classes: Vec<&str> = self
            .by_structure
            .values()
            .flat_map(|chains| chains.values().map(|e| e.equivalence_class.as_str()))
            .collect();
        classes.sort_unstable();
        classes.dedup();
        classes.len()
    }
}

/// "4V9F|1|A+4V9F|1|B" → [("4V9F", "A"), ("4V9F", "B")]
///
/// Sub-IFEs with fewer than three '|' fields, or an empty structure or
/// chain, are dropped.
fn parse_ife(ife: &str) -> Vec<(String, String)> {
    ife.trim()
        .split('+')
        .filter_map(|sub| {
            let parts: Vec<&str> = sub.trim().split('|').collect();
            if parts.len() < 3 {
                return None;
            }
            let structure = parts[0].trim().to_ascii_uppercase();
            let chain = parts[2].trim().to_string();
            (!structure.is_empty() && !chain.is_empty()).then_some((structure, chain))
        })
        .collect()
}
