//! Residue unit identifiers
//!
//! Unit ids have the shape `PDB|Model|Chain|Nucleotide|Number`, e.g.
//! `4V9F|1|0|U|55`. Trailing fields (alternate id, insertion code) are
//! ignored.

use crate::types::{RecordError, ResidueSpec};

/// Parse one unit id
///
/// A non-numeric model defaults to 1; a non-integer residue number is an
/// error.
pub fn parse_unit_id(unit_id: &str) -> Result<ResidueSpec, RecordError> {
    let parts: Vec<&str> = unit_id.trim().split('|').collect();
    if parts.len() < 5 {
        return Err(RecordError::TooFewFields {
            expected: 5,
            found: parts.len(),
        });
    }

    let model = parts[1].trim().parse::<u32>().unwrap_or(1);
    let chain = parts[2].trim();
    if chain.is_empty() {
        return Err(RecordError::MissingField("chain"));
    }
    let nucleotide = parts[3]
        .trim()
        .chars()
        .next()
        .unwrap_or(ResidueSpec::UNKNOWN_NUCLEOTIDE);
    let number = parts[4]
        .trim()
        .parse::<i32>()
        .map_err(|_| RecordError::invalid("residue number", parts[4]))?;

    Ok(ResidueSpec::new(chain, number)
        .with_nucleotide(nucleotide)
        .with_model(model))
}

/// Parse a comma-separated unit id list, skipping malformed entries
pub fn parse_unit_id_list(list: &str) -> Vec<ResidueSpec> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|spec| match parse_unit_id(spec) {
            Ok(residue) => Some(residue),
            Err(e) => {
                tracing::debug!(unit_id = %spec, error = %e, "Skipping residue");
                None
            }
        })
        .collect()
}
