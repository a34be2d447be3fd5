//! BGSU RNA 3D Hub source
//!
//! Hybrid fetch of one structure's loops:
//! - Loop download (`{loops_base}/{PDB}`) supplies residues as
//!   `"LOOP_ID","PDB|M|C|N|Num,..."` pairs
//! - Motif table page (`{html_base}/{PDB}/motifs`) supplies the semantic
//!   annotation and motif group per loop id
//!
//! The loop download is authoritative for which loops exist. The motif
//! table only names them; when it cannot be fetched or parsed the loops
//! fall back to their loop-class names.
//!
//! # Categories
//! 1. Annotation contains a known semantic pattern → canonical family name
//! 2. Annotation present but unrecognized → the annotation itself
//! 3. No annotation → descriptive loop class ("Hairpin Loop (HL)")

use super::http::{join_url, WebClient};
use super::patterns::{html_text, patterns, Patterns};
use super::unit_id::parse_unit_id_list;
use crate::reconcile::GenericCategory;
use crate::types::{
    meta, MotifCollection, MotifInstance, MotifSource, ResidueSpec, SourceError, StructureId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Source name
pub const BGSU_SOURCE_NAME: &str = "BGSU RNA 3D Hub";

/// `source` metadata when motif-table annotations were merged in
pub const SOURCE_TAG_HYBRID: &str = "bgsu_hybrid";
/// `source` metadata for loop-download-only results
pub const SOURCE_TAG_LOOPS_ONLY: &str = "bgsu_csv";

/// Motif table placeholder meaning "no annotation"
const NO_ANNOTATION: &str = "No text annotation";

/// Canonical family name → case-insensitive substrings, checked in order
const SEMANTIC_PATTERNS: &[(&str, &[&str])] = &[
    ("Kink-turn", &["Kink-turn", "kink turn"]),
    ("C-loop", &["C-loop", "mini C-loop"]),
    ("GNRA", &["GNRA"]),
    ("Sarcin-Ricin", &["Sarcin", "Sarcin-Ricin"]),
    ("E-loop", &["E-loop"]),
    ("UAA/GAN", &["UAA/GAN"]),
    ("Triple sheared", &["Triple sheared"]),
    ("Major groove platform", &["Major groove platform"]),
    ("Minor groove platform", &["Minor groove platform"]),
    ("Tetraloop", &["tetraloop"]),
    ("Bulged", &["bulged"]),
    ("UNCG", &["UNCG"]),
    ("T-loop", &["T-loop"]),
    ("Pseudoknot", &["pseudoknot"]),
];

/// One loop from the loop download
#[derive(Debug, Clone, PartialEq)]
pub struct LoopRecord {
    pub loop_id: String,
    /// Leading loop id segment (HL, IL, J3, ...)
    pub loop_type: String,
    pub residues: Vec<ResidueSpec>,
}

/// Motif-table annotation for one loop
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoopAnnotation {
    /// Semantic annotation (`None` for "No text annotation" or empty)
    pub annotation: Option<String>,
    /// Motif group id (may be empty)
    pub motif_group: String,
}

/// BGSU RNA 3D Hub adapter
pub struct BgsuHubSource {
    client: WebClient,
    html_base: String,
    loops_base: String,
    cache: Mutex<HashMap<StructureId, MotifCollection>>,
}

impl BgsuHubSource {
    pub fn new(client: WebClient, html_base: impl Into<String>, loops_base: impl Into<String>) -> Self {
        Self {
            client,
            html_base: html_base.into(),
            loops_base: loops_base.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn fetch(&self, structure: &StructureId) -> Result<MotifCollection, SourceError> {
        let patterns = patterns()?;

        let loops_url = join_url(&self.loops_base, structure.as_str());
        let body = match self.client.get_text(&loops_url, "text/csv, text/plain, */*").await {
            Ok(body) => body,
            Err(SourceError::NotFound(_)) => {
                info!(structure = %structure, "Structure not in RNA 3D Hub");
                return Ok(MotifCollection::new());
            }
            Err(e) => return Err(e),
        };
        let loops = parse_loop_download(patterns, &body);

        let html_url = join_url(&self.html_base, &format!("{}/motifs", structure));
        let annotations = match self.client.get_text(&html_url, "text/html").await {
            Ok(html) => {
                let parsed = parse_motif_table(patterns, &html);
                if parsed.is_empty() {
                    debug!(structure = %structure, "Motif table had no annotated rows");
                    None
                } else {
                    debug!(structure = %structure, rows = parsed.len(), "Parsed motif table");
                    Some(parsed)
                }
            }
            Err(SourceError::NotFound(_)) => {
                debug!(structure = %structure, "No motif table page");
                None
            }
            Err(e) => {
                warn!(structure = %structure, error = %e, "Motif table unavailable; using loop classes");
                None
            }
        };

        let collection = build_collection(structure.as_str(), loops, annotations.as_ref());
        info!(
            structure = %structure,
            categories = collection.category_count(),
            instances = collection.total_instances(),
            annotated = annotations.is_some(),
            "Fetched RNA 3D Hub loops"
        );
        Ok(collection)
    }
}

#[async_trait]
impl MotifSource for BgsuHubSource {
    fn name(&self) -> &'static str {
        BGSU_SOURCE_NAME
    }

    async fn get_motifs_for_structure(
        &self,
        structure: &StructureId,
    ) -> Result<MotifCollection, SourceError> {
        if let Some(cached) = self.cache.lock().await.get(structure) {
            return Ok(cached.clone());
        }
        let collection = self.fetch(structure).await?;
        if !collection.is_empty() {
            self.cache.lock().await.insert(structure.clone(), collection.clone());
        }
        Ok(collection)
    }
}

/// Parse every `"LOOP_ID","RESIDUES"` pair
///
/// Loop ids with fewer than two `_` segments and loops without a single
/// parseable residue are skipped.
pub fn parse_loop_download(patterns: &Patterns, body: &str) -> Vec<LoopRecord> {
    patterns
        .loop_row
        .captures_iter(body)
        .filter_map(|caps| {
            let loop_id = caps[1].trim();
            let mut segments = loop_id.split('_');
            let loop_type = segments.next().unwrap_or_default();
            if segments.next().is_none() {
                debug!(loop_id = %loop_id, "Skipping malformed loop id");
                return None;
            }
            let residues = parse_unit_id_list(&caps[2]);
            if residues.is_empty() {
                debug!(loop_id = %loop_id, "Skipping loop without residues");
                return None;
            }
            Some(LoopRecord {
                loop_id: loop_id.to_string(),
                loop_type: loop_type.to_string(),
                residues,
            })
        })
        .collect()
}

/// Parse the motif table into loop id → annotation
///
/// Rows need at least four cells and a loop id in cell 1. Cell 3 carries
/// the annotation text followed by the motif group id; cell 4 is searched
/// for the group id when cell 3 has none.
pub fn parse_motif_table(patterns: &Patterns, html: &str) -> HashMap<String, LoopAnnotation> {
    let mut annotations = HashMap::new();

    for body in patterns.tbody.captures_iter(html) {
        for row in patterns.row.captures_iter(&body[1]) {
            let cells: Vec<String> = patterns
                .cell
                .captures_iter(&row[1])
                .map(|c| html_text(patterns, &c[1]))
                .collect();
            if cells.len() < 4 {
                continue;
            }
            let Some(loop_id) = patterns.loop_id.find(&cells[1]) else {
                continue;
            };

            let raw = cells[3].as_str();
            let (annotation_text, mut motif_group) = match patterns.motif_group.find(raw) {
                Some(m) => (raw[..m.start()].trim(), m.as_str().to_string()),
                None => (raw, String::new()),
            };
            if motif_group.is_empty() {
                if let Some(m) = cells.get(4).and_then(|c| patterns.motif_group.find(c)) {
                    motif_group = m.as_str().to_string();
                }
            }

            let annotation = (!annotation_text.is_empty() && annotation_text != NO_ANNOTATION)
                .then(|| annotation_text.to_string());

            annotations.insert(
                loop_id.as_str().to_string(),
                LoopAnnotation {
                    annotation,
                    motif_group,
                },
            );
        }
    }

    annotations
}

/// Resolve a loop's category from its annotation or loop type
pub fn categorize(annotation: Option<&str>, loop_type: &str) -> String {
    if let Some(text) = annotation {
        let lower = text.to_lowercase();
        for (family, needles) in SEMANTIC_PATTERNS {
            if needles.iter().any(|n| lower.contains(&n.to_lowercase())) {
                return (*family).to_string();
            }
        }
        return text.to_string();
    }
    GenericCategory::from_loop_code(loop_type)
        .map(|c| c.descriptive_name())
        .unwrap_or_else(|| loop_type.to_string())
}

/// Build the collection from loops and (optionally) motif-table annotations
pub fn build_collection(
    pdb_id: &str,
    loops: Vec<LoopRecord>,
    annotations: Option<&HashMap<String, LoopAnnotation>>,
) -> MotifCollection {
    let mut collection = MotifCollection::new();

    for record in loops {
        let instance = match annotations {
            Some(table) => {
                let entry = table.get(&record.loop_id).cloned().unwrap_or_default();
                let category = categorize(entry.annotation.as_deref(), &record.loop_type);
                let annotation = entry.annotation.unwrap_or_else(|| category.clone());
                MotifInstance::new(record.loop_id, category, pdb_id, record.residues)
                    .with_annotation(annotation)
                    .with_meta(meta::SOURCE, SOURCE_TAG_HYBRID)
                    .with_meta(meta::MOTIF_GROUP, entry.motif_group)
                    .with_meta(meta::LOOP_TYPE, record.loop_type)
            }
            None => {
                let category = categorize(None, &record.loop_type);
                MotifInstance::new(record.loop_id, category, pdb_id, record.residues)
                    .with_meta(meta::SOURCE, SOURCE_TAG_LOOPS_ONLY)
                    .with_meta(meta::LOOP_TYPE, record.loop_type)
            }
        };
        collection.insert_instance(instance.motif_id.clone(), instance);
    }

    collection
}
