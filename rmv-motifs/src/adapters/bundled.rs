//! Bundled offline datasets (RNA 3D Motif Atlas, Rfam)
//!
//! One JSON file per structure, `{dataset_dir}/{PDB}.json` (upper- or
//! lower-case stem):
//!
//! ```json
//! {
//!   "HL": [
//!     {"instance_id": "HL_1S72_001",
//!      "residues": ["1S72|1|0|G|55", "1S72|1|0|A|56"],
//!      "annotation": "optional text",
//!      "motif_group": "HL_34789.4"}
//!   ]
//! }
//! ```
//!
//! Categories are returned exactly as shipped.

use super::unit_id::parse_unit_id_list;
use crate::types::{
    meta, MotifCollection, MotifInstance, MotifSource, RecordError, SourceError, StructureId,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Atlas source name
pub const ATLAS_SOURCE_NAME: &str = "RNA 3D Motif Atlas";
/// Local Rfam source name
pub const RFAM_LOCAL_SOURCE_NAME: &str = "Rfam (local)";

#[derive(Debug, Deserialize)]
struct BundledRecord {
    instance_id: String,
    residues: Vec<String>,
    #[serde(default)]
    annotation: Option<String>,
    #[serde(default)]
    motif_group: Option<String>,
}

/// Offline dataset adapter
pub struct BundledSource {
    name: &'static str,
    source_tag: &'static str,
    dataset_dir: PathBuf,
    cache: Mutex<HashMap<StructureId, MotifCollection>>,
}

impl BundledSource {
    pub fn new(name: &'static str, source_tag: &'static str, dataset_dir: impl Into<PathBuf>) -> Self {
        Self {
            name,
            source_tag,
            dataset_dir: dataset_dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// RNA 3D Motif Atlas (generic loop-class categories)
    pub fn atlas(dataset_dir: impl Into<PathBuf>) -> Self {
        Self::new(ATLAS_SOURCE_NAME, "atlas", dataset_dir)
    }

    /// Rfam local dataset (family-named categories)
    pub fn rfam_local(dataset_dir: impl Into<PathBuf>) -> Self {
        Self::new(RFAM_LOCAL_SOURCE_NAME, "rfam_local", dataset_dir)
    }

    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }

    fn dataset_file(&self, structure: &StructureId) -> Option<PathBuf> {
        [structure.as_str().to_string(), structure.to_lowercase()]
            .into_iter()
            .map(|stem| self.dataset_dir.join(format!("{}.json", stem)))
            .find(|path| path.is_file())
    }
}

#[async_trait]
impl MotifSource for BundledSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn get_motifs_for_structure(
        &self,
        structure: &StructureId,
    ) -> Result<MotifCollection, SourceError> {
        if let Some(cached) = self.cache.lock().await.get(structure) {
            return Ok(cached.clone());
        }

        let Some(path) = self.dataset_file(structure) else {
            info!(
                source = self.name,
                structure = %structure,
                dir = %self.dataset_dir.display(),
                "Structure not in bundled dataset"
            );
            return Ok(MotifCollection::new());
        };

        let content = tokio::fs::read_to_string(&path).await?;
        let collection = parse_dataset(structure.as_str(), self.source_tag, &content)
            .map_err(|e| SourceError::Parse(format!("{}: {}", path.display(), e)))?;

        info!(
            source = self.name,
            structure = %structure,
            categories = collection.category_count(),
            instances = collection.total_instances(),
            "Loaded bundled motifs"
        );
        self.cache.lock().await.insert(structure.clone(), collection.clone());
        Ok(collection)
    }
}

/// Parse one dataset document
///
/// The document must be a JSON object of arrays; individual records that
/// do not match the record shape, or have no parseable residue, are skipped.
pub fn parse_dataset(
    pdb_id: &str,
    source_tag: &str,
    content: &str,
) -> Result<MotifCollection, serde_json::Error> {
    let document: BTreeMap<String, Vec<Value>> = serde_json::from_str(content)?;

    let mut collection = MotifCollection::new();
    for (category, records) in document {
        for record in records {
            match parse_record(pdb_id, source_tag, &category, record) {
                Ok(instance) => collection.insert_instance(category.clone(), instance),
                Err(e) => debug!(category = %category, error = %e, "Skipping bundled record"),
            }
        }
    }
    Ok(collection)
}

fn parse_record(
    pdb_id: &str,
    source_tag: &str,
    category: &str,
    record: Value,
) -> Result<MotifInstance, RecordError> {
    let record: BundledRecord =
        serde_json::from_value(record).map_err(|e| RecordError::invalid("record", e.to_string()))?;

    let residues = parse_unit_id_list(&record.residues.join(","));
    if residues.is_empty() {
        return Err(RecordError::NoResidues);
    }

    let mut instance = MotifInstance::new(record.instance_id, category, pdb_id, residues)
        .with_meta(meta::SOURCE, source_tag);
    if let Some(annotation) = record.annotation.filter(|a| !a.trim().is_empty()) {
        instance = instance.with_annotation(annotation);
    }
    if let Some(group) = record.motif_group {
        instance = instance.with_meta(meta::MOTIF_GROUP, group);
    }
    Ok(instance)
}
