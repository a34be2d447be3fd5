//! Rfam motif API source
//!
//! Endpoint: `{base}/{PDB}` returning
//!
//! ```json
//! {"hits": [{"motif_acc": "RM00008", "motif_name": "GNRA", "chain": "A",
//!            "start": 10, "end": 17, "sequence": "GCGAAAGC", "score": 14.2}]}
//! ```
//!
//! Hits carry family names already, so no enrichment is applied to this
//! source. Each hit is parsed independently; a bad hit is skipped.

use super::http::{join_url, WebClient};
use crate::types::{
    expand_range, meta, MotifCollection, MotifInstance, MotifSource, RecordError, SourceError,
    StructureId,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Source name
pub const RFAM_API_SOURCE_NAME: &str = "Rfam API";

const SOURCE_TAG: &str = "rfam_api";

/// Rfam motif API adapter
pub struct RfamApiSource {
    client: WebClient,
    base_url: String,
    cache: Mutex<HashMap<StructureId, MotifCollection>>,
}

impl RfamApiSource {
    pub fn new(client: WebClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl MotifSource for RfamApiSource {
    fn name(&self) -> &'static str {
        RFAM_API_SOURCE_NAME
    }

    async fn get_motifs_for_structure(
        &self,
        structure: &StructureId,
    ) -> Result<MotifCollection, SourceError> {
        if let Some(cached) = self.cache.lock().await.get(structure) {
            return Ok(cached.clone());
        }

        let url = join_url(&self.base_url, structure.as_str());
        let body = match self.client.get_text(&url, "application/json").await {
            Ok(body) => body,
            Err(SourceError::NotFound(_)) => {
                info!(structure = %structure, "Structure has no Rfam motif hits");
                return Ok(MotifCollection::new());
            }
            Err(e) => return Err(e),
        };

        let collection = parse_hits(structure.as_str(), &body)?;
        info!(
            structure = %structure,
            categories = collection.category_count(),
            instances = collection.total_instances(),
            "Fetched Rfam motif hits"
        );
        self.cache.lock().await.insert(structure.clone(), collection.clone());
        Ok(collection)
    }
}

/// Parse a hits document; the document must be JSON with a `hits` array
pub fn parse_hits(pdb_id: &str, body: &str) -> Result<MotifCollection, SourceError> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::Parse(format!("Rfam response is not JSON: {}", e)))?;
    let hits = document
        .get("hits")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Parse("Rfam response has no hits array".to_string()))?;

    let mut collection = MotifCollection::new();
    for (i, hit) in hits.iter().enumerate() {
        match parse_hit(pdb_id, hit) {
            Ok(instance) => collection.insert_instance(instance.motif_id.clone(), instance),
            Err(e) => debug!(hit = i, error = %e, "Skipping Rfam hit"),
        }
    }
    Ok(collection)
}

fn text_field<'a>(hit: &'a Value, field: &'static str) -> Result<&'a str, RecordError> {
    hit.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(RecordError::MissingField(field))
}

fn residue_field(hit: &Value, field: &'static str) -> Result<i32, RecordError> {
    let value = hit.get(field).ok_or(RecordError::MissingField(field))?;
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| RecordError::invalid(field, value.to_string()))
}

fn parse_hit(pdb_id: &str, hit: &Value) -> Result<MotifInstance, RecordError> {
    let accession = text_field(hit, "motif_acc")?;
    let name = text_field(hit, "motif_name")?;
    let chain = text_field(hit, "chain")?;
    let start = residue_field(hit, "start")?;
    let end = residue_field(hit, "end")?;
    if end < start {
        return Err(RecordError::invalid("range", format!("{}-{}", start, end)));
    }

    let sequence = hit.get("sequence").and_then(Value::as_str);
    let residues = expand_range(chain, start, end, sequence)?;
    let instance_id = format!("{}_{}_{}_{}_{}", accession, pdb_id, chain, start, end);

    let mut instance = MotifInstance::new(instance_id, name, pdb_id, residues)
        .with_meta(meta::MOTIF_ACC, accession)
        .with_meta(meta::SOURCE, SOURCE_TAG);
    if let Some(score) = hit.get("score").and_then(Value::as_f64) {
        instance = instance.with_meta(meta::SCORE, score);
    }
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hits() {
        let body = r#"{"hits": [
            {"motif_acc": "RM00008", "motif_name": "GNRA", "chain": "A", "start": 10, "end": 13,
             "sequence": "GAAA", "score": 14.2},
            {"motif_acc": "RM00003", "motif_name": "Kink-turn", "chain": "B", "start": 5, "end": 4},
            {"motif_acc": "RM00003", "motif_name": "Kink-turn", "chain": "", "start": 1, "end": 4},
            {"motif_name": "C-loop", "chain": "A", "start": 1, "end": 4}
        ]}"#;
        let collection = parse_hits("1ABC", body).unwrap();
        assert_eq!(collection.total_instances(), 1);

        let gnra = &collection.get("GNRA").unwrap()[0];
        assert_eq!(gnra.instance_id, "RM00008_1ABC_A_10_13");
        assert_eq!(gnra.residues.len(), 4);
        assert_eq!(gnra.residues[0].nucleotide, 'G');
        assert_eq!(gnra.metadata[meta::SCORE].as_f64(), Some(14.2));
    }

    #[test]
    fn test_oversized_range_hit_is_skipped() {
        let body = r#"{"hits": [
            {"motif_acc": "RM00008", "motif_name": "GNRA", "chain": "A", "start": 1, "end": 10000000},
            {"motif_acc": "RM00008", "motif_name": "GNRA", "chain": "A", "start": -2147483648, "end": 2147483647},
            {"motif_acc": "RM00010", "motif_name": "T-loop", "chain": "A", "start": 50, "end": 56}
        ]}"#;
        let collection = parse_hits("1ABC", body).unwrap();
        assert_eq!(collection.total_instances(), 1);
        assert!(collection.get("GNRA").is_none());
        assert_eq!(collection.get("T-loop").unwrap()[0].residues.len(), 7);
    }

    #[test]
    fn test_non_json_is_parse_error() {
        assert!(matches!(parse_hits("1ABC", "<html>"), Err(SourceError::Parse(_))));
        assert!(matches!(parse_hits("1ABC", "{\"x\": 1}"), Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_empty_hits_is_empty_collection() {
        assert!(parse_hits("1ABC", r#"{"hits": []}"#).unwrap().is_empty());
    }
}
