//! FR3D loop tables
//!
//! Header row plus one loop per row:
//!
//! ```text
//! Motif order,Motif type,Resolution,Positions,Sequence,cWW,Description
//! 1,Hairpin,NA,"1S72|1|0|13-20","GCGAAAGC",2,"Hairpin with 2 base pairs"
//! ```
//!
//! `Positions` is `PDB|model|chain|start-end`. FR3D reports neither score
//! nor p-value.

use crate::types::{expand_range, meta, MotifCollection, MotifInstance, RecordError};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use tracing::debug;

const COL_MOTIF_TYPE: &str = "Motif type";
const COL_POSITIONS: &str = "Positions";
const COL_SEQUENCE: &str = "Sequence";
const COL_DESCRIPTION: &str = "Description";

/// Parsed `Positions` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fr3dPositions {
    pub pdb_id: String,
    pub chain: String,
    pub start: i32,
    pub end: i32,
}

/// Parse `PDB|model|chain|start-end`
pub fn parse_positions(field: &str) -> Result<Fr3dPositions, RecordError> {
    let parts: Vec<&str> = field.trim().trim_matches('"').split('|').collect();
    if parts.len() != 4 {
        return Err(RecordError::invalid("positions", field));
    }
    let (start, end) = parts[3]
        .split_once('-')
        .ok_or_else(|| RecordError::invalid("positions range", parts[3]))?;
    let start = start
        .trim()
        .parse::<i32>()
        .map_err(|_| RecordError::invalid("range start", start))?;
    let end = end
        .trim()
        .parse::<i32>()
        .map_err(|_| RecordError::invalid("range end", end))?;
    Ok(Fr3dPositions {
        pdb_id: parts[0].trim().to_string(),
        chain: parts[2].trim().to_string(),
        start,
        end,
    })
}

/// Parse a table; `delimiter` is b',' for .csv/.txt and b'\t' for .tsv
pub fn parse_table<R: Read>(reader: R, delimiter: u8, pdb_id: &str) -> MotifCollection {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = match csv_reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            debug!(error = %e, "FR3D table has no readable header");
            return MotifCollection::new();
        }
    };

    let mut collection = MotifCollection::new();
    for (row_no, record) in csv_reader.records().enumerate() {
        let parsed = record
            .map_err(|e| RecordError::invalid("row", e.to_string()))
            .and_then(|r| parse_row(&headers, &r, pdb_id));
        match parsed {
            Ok(instance) => collection.insert_instance(instance.motif_id.clone(), instance),
            Err(e) => debug!(row = row_no + 2, error = %e, "Skipping FR3D row"),
        }
    }
    collection
}

fn field<'a>(headers: &StringRecord, record: &'a StringRecord, name: &str) -> &'a str {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|i| record.get(i))
        .map(|v| v.trim_matches('"'))
        .unwrap_or("")
}

fn parse_row(headers: &StringRecord, record: &StringRecord, pdb_id: &str) -> Result<MotifInstance, RecordError> {
    let motif_type = field(headers, record, COL_MOTIF_TYPE);
    if motif_type.is_empty() {
        return Err(RecordError::MissingField("Motif type"));
    }
    let positions_field = field(headers, record, COL_POSITIONS);
    if positions_field.is_empty() {
        return Err(RecordError::MissingField("Positions"));
    }
    let positions = parse_positions(positions_field)?;
    let sequence = field(headers, record, COL_SEQUENCE);
    let description = field(headers, record, COL_DESCRIPTION);

    let residues = expand_range(&positions.chain, positions.start, positions.end, Some(sequence))?;
    if residues.is_empty() {
        return Err(RecordError::NoResidues);
    }

    let instance_id = format!(
        "FR3D_{}_{}_{}_{}",
        positions.pdb_id, positions.chain, positions.start, positions.end
    );
    let annotation = format!("{} | Range: {}-{}", description, positions.start, positions.end);
    let residue_count = residues.len();

    Ok(MotifInstance::new(instance_id, motif_type, pdb_id, residues)
        .with_annotation(annotation)
        .with_meta(meta::POSITIONS, format!("{}-{}", positions.start, positions.end))
        .with_meta(meta::CHAIN, positions.chain.as_str())
        .with_meta(meta::SEQUENCE_LENGTH, sequence.chars().count())
        .with_meta(meta::RESIDUE_COUNT, residue_count)
        .with_meta(meta::SOURCE, "fr3d"))
}
