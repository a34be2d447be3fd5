//! RNAMotifScan result files
//!
//! `{family_dir}/Res_{pdb}`; one hit per tab-delimited line:
//!
//! ```text
//! 1s72_09	location: '0'71-'0'83/'0'91-'0'106	Score: 60.800	P-value: 0.00928	FPR: 0.00000
//! ```
//!
//! Each `/`-separated region holds two `'chain'number` tokens; the first
//! token's chain is used for the whole region.

use crate::adapters::patterns::Patterns;
use crate::types::{expand_range, meta, MetadataValue, MotifInstance, RecordError, ResidueSpec};
use tracing::debug;

/// Canonical family name from a result folder name
pub fn family_from_folder(folder: &str) -> String {
    let lower = folder.to_lowercase();
    match lower.as_str() {
        "kturn" | "kink_turn" | "kink-turn" => "KINK-TURN".to_string(),
        "c_loop" | "c-loop" => "C-LOOP".to_string(),
        "e_loop" | "e-loop" => "E-LOOP".to_string(),
        _ if lower.contains("sarcin") => "SARCIN-RICIN".to_string(),
        _ if lower.contains("reverse") => "REVERSE-KINK-TURN".to_string(),
        _ => folder.to_uppercase().replace('_', "-"),
    }
}

/// Parse `'c'S-'c'E/'c'S-'c'E` into (chain, start, end) regions
pub fn parse_location(patterns: &Patterns, location: &str) -> Vec<(String, i32, i32)> {
    location
        .split('/')
        .filter_map(|part| {
            let tokens: Vec<(String, i32)> = patterns
                .quoted_chain_number
                .captures_iter(part.trim())
                .filter_map(|c| c[2].parse::<i32>().ok().map(|n| (c[1].to_string(), n)))
                .collect();
            match tokens.as_slice() {
                [(chain, start), (_, end), ..] => Some((chain.clone(), *start, *end)),
                _ => None,
            }
        })
        .collect()
}

/// Parse every hit line; malformed lines are skipped
pub fn parse_hits(patterns: &Patterns, content: &str, family: &str, pdb_id: &str) -> Vec<MotifInstance> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match parse_line(patterns, line, i + 1, family, pdb_id) {
            Ok(instance) => Some(instance),
            Err(e) => {
                debug!(line = i + 1, family = %family, error = %e, "Skipping RNAMotifScan line");
                None
            }
        })
        .collect()
}

fn parse_line(
    patterns: &Patterns,
    line: &str,
    line_no: usize,
    family: &str,
    pdb_id: &str,
) -> Result<MotifInstance, RecordError> {
    let fields: Vec<&str> = line.trim().split('\t').map(str::trim).collect();
    if fields.len() < 4 {
        return Err(RecordError::TooFewFields {
            expected: 4,
            found: fields.len(),
        });
    }

    let hit_id = fields[0];
    let location = fields[1]
        .strip_prefix("location:")
        .unwrap_or(fields[1])
        .trim();
    let score = fields[2]
        .replace("Score:", "")
        .trim()
        .parse::<f64>()
        .unwrap_or(0.0);
    let p_value = fields[3]
        .replace("P-value:", "")
        .trim()
        .parse::<f64>()
        .unwrap_or(1.0);

    let regions = parse_location(patterns, location);
    if regions.is_empty() {
        return Err(RecordError::invalid("location", location));
    }

    let mut residues: Vec<ResidueSpec> = Vec::new();
    for (chain, start, end) in &regions {
        residues.extend(expand_range(chain, *start, *end, None)?);
    }
    if residues.is_empty() {
        return Err(RecordError::NoResidues);
    }

    Ok(MotifInstance::new(format!("RMS_{}_{}", hit_id, line_no), family, pdb_id, residues)
        .with_annotation(format!("Score: {}, P-value: {}", score, p_value))
        .with_meta(meta::P_VALUE, p_value)
        .with_meta(meta::ALIGNMENT_SCORE, score)
        .with_meta(meta::REGIONS, MetadataValue::Regions(regions))
        .with_meta(meta::SOURCE, "rna_motif_scan"))
}
