//! RNAMotifScanX result logs
//!
//! `{family_dir}/result_*.log`, tab-delimited with a `#` header:
//!
//! ```text
//! #fragment_ID	aligned_regions	alignment_score	P-value
//! 1S72_0:75-85_89-98	0:'0'77-4:'0'81,13:'0'93-20:'0'100	144.8	0.00733485
//! ```
//!
//! Aligned regions, when parseable, replace the fragment ranges as the
//! residue source. Several logs may sit in one family folder; the first
//! non-empty one that mentions the structure is used, in priority order.

use crate::adapters::patterns::Patterns;
use crate::types::{expand_range, meta, MetadataValue, MotifInstance, RecordError, ResidueSpec};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Preferred result logs, best first
pub const PRIORITY_RESULT_FILES: &[&str] = &[
    "result_0_100_withbs.log",
    "result_0_100.log",
    "result_0_withbs.log",
    "result_0.log",
];

/// Bytes inspected when checking that a log mentions the structure
const SNIFF_BYTES: u64 = 500;

/// Family name from a result folder (`k-turn_consensus` → `K-TURN`)
pub fn family_from_folder(folder: &str) -> String {
    folder.replace("_consensus", "").to_uppercase()
}

/// Pick the result log for a structure within one family folder
pub fn select_result_file(family_dir: &Path, pdb_id: &str) -> Option<PathBuf> {
    let upper = pdb_id.to_uppercase();
    let lower = pdb_id.to_lowercase();
    let mentions = |path: &Path| -> bool {
        let Ok(file) = std::fs::File::open(path) else {
            return false;
        };
        let mut head = Vec::new();
        if file.take(SNIFF_BYTES).read_to_end(&mut head).is_err() {
            return false;
        }
        let head = String::from_utf8_lossy(&head);
        head.contains(&upper) || head.contains(&lower)
    };
    let usable = |path: &Path| -> bool {
        path.is_file()
            && std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
            && mentions(path)
    };

    if let Some(found) = PRIORITY_RESULT_FILES
        .iter()
        .map(|name| family_dir.join(name))
        .find(|path| usable(path))
    {
        return Some(found);
    }

    WalkDir::new(family_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("result_") && n.ends_with(".log"))
        })
        .find(|path| usable(path))
}

/// Split `PDB_CHAIN:S-E_S-E` into (pdb, chain, ranges)
///
/// Chain defaults to "0" when the prefix has no `_`. Range tokens that do
/// not start with `digits-digits` are ignored.
pub fn parse_fragment_id(patterns: &Patterns, fragment_id: &str) -> Option<(String, String, Vec<(i32, i32)>)> {
    let (prefix, ranges) = fragment_id.split_once(':')?;
    if ranges.contains(':') {
        return None;
    }
    let mut prefix_parts = prefix.split('_');
    let pdb = prefix_parts.next().unwrap_or_default().to_string();
    let chain = prefix_parts.next().unwrap_or("0").to_string();

    let ranges = ranges
        .split('_')
        .filter_map(|token| {
            let caps = patterns.fragment_range.captures(token)?;
            Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
        })
        .collect();
    Some((pdb, chain, ranges))
}

/// Parse `i:'c'S-j:'c'E,...` into residue ranges
pub fn parse_aligned_regions(patterns: &Patterns, aligned: &str) -> Vec<(i32, i32)> {
    aligned
        .split(',')
        .filter_map(|pair| {
            let caps = patterns.aligned_region.captures(pair)?;
            Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
        })
        .collect()
}

/// Parse every hit line; headers, notices and malformed lines are skipped
pub fn parse_hits(patterns: &Patterns, content: &str, family: &str, pdb_id: &str) -> Vec<MotifInstance> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| {
            !line.is_empty() && !line.starts_with('#') && !line.starts_with("No base-stacking")
        })
        .filter_map(|(line_no, line)| match parse_line(patterns, line, family, pdb_id) {
            Ok(instance) => Some(instance),
            Err(e) => {
                debug!(line = line_no, family = %family, error = %e, "Skipping RNAMotifScanX line");
                None
            }
        })
        .collect()
}

fn parse_line(patterns: &Patterns, line: &str, family: &str, pdb_id: &str) -> Result<MotifInstance, RecordError> {
    let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(RecordError::TooFewFields {
            expected: 3,
            found: fields.len(),
        });
    }

    let fragment_id = fields[0];
    let score = fields[2].parse::<f64>().unwrap_or(0.0);
    let p_value = fields
        .get(3)
        .and_then(|p| p.parse::<f64>().ok())
        .unwrap_or(1.0);

    let (_, chain, fragment_ranges) = parse_fragment_id(patterns, fragment_id)
        .ok_or_else(|| RecordError::invalid("fragment id", fragment_id))?;
    if fragment_ranges.is_empty() {
        return Err(RecordError::invalid("fragment ranges", fragment_id));
    }

    let aligned = parse_aligned_regions(patterns, fields[1]);
    let ranges = if aligned.is_empty() { &fragment_ranges } else { &aligned };
    let mut residues: Vec<ResidueSpec> = Vec::new();
    for (start, end) in ranges {
        residues.extend(expand_range(&chain, *start, *end, None)?);
    }
    if residues.is_empty() {
        return Err(RecordError::NoResidues);
    }

    let instance_id = format!("RMSX_{}", fragment_id.replace([':', '-'], "_"));
    Ok(MotifInstance::new(instance_id, family, pdb_id, residues)
        .with_annotation(format!("Score: {}, P-value: {}", score, p_value))
        .with_meta(meta::P_VALUE, p_value)
        .with_meta(meta::ALIGNMENT_SCORE, score)
        .with_meta(meta::ALIGNED_REGIONS, MetadataValue::Ranges(aligned))
        .with_meta(meta::FRAGMENT_ID, fragment_id)
        .with_meta(meta::CHAIN, chain.as_str())
        .with_meta(meta::SOURCE, "rna_motif_scan_x"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::patterns::patterns;
    use tempfile::TempDir;

    #[test]
    fn test_family_from_folder() {
        assert_eq!(family_from_folder("k-turn_consensus"), "K-TURN");
        assert_eq!(family_from_folder("sarcin-ricin"), "SARCIN-RICIN");
    }

    #[test]
    fn test_parse_fragment_id() {
        let p = patterns().unwrap();
        let (pdb, chain, ranges) = parse_fragment_id(p, "1S72_0:75-85_89-98_58-60").unwrap();
        assert_eq!((pdb.as_str(), chain.as_str()), ("1S72", "0"));
        assert_eq!(ranges, vec![(75, 85), (89, 98), (58, 60)]);

        let (_, chain, _) = parse_fragment_id(p, "1S72:1-2").unwrap();
        assert_eq!(chain, "0");
        assert!(parse_fragment_id(p, "no-colon").is_none());
    }

    #[test]
    fn test_aligned_regions_replace_fragment_ranges() {
        let content = "\
#fragment_ID\taligned_regions\talignment_score\tP-value
1S72_0:75-85_89-98\t0:'0'77-4:'0'81,13:'0'93-20:'0'94\t144.8\t0.00733485
No base-stacking found
1S72_A:10-12\t\t20.5
1S72_0:nothing\tx\t1.0\t0.01
short\tline
";
        let hits = parse_hits(patterns().unwrap(), content, "K-TURN", "1S72");
        assert_eq!(hits.len(), 2);

        let aligned = &hits[0];
        assert_eq!(aligned.instance_id, "RMSX_1S72_0_75_85_89_98");
        let numbers: Vec<i32> = aligned.residues.iter().map(|r| r.residue_number).collect();
        assert_eq!(numbers, vec![77, 78, 79, 80, 81, 93, 94]);

        let fallback = &hits[1];
        assert_eq!(fallback.residues.len(), 3);
        assert_eq!(fallback.residues[0].chain, "A");
        assert_eq!(fallback.p_value(), Some(1.0));
    }

    #[test]
    fn test_select_result_file_priority_and_sniffing() {
        let dir = TempDir::new().unwrap();
        let family = dir.path();
        std::fs::write(family.join("result_0_100_withbs.log"), "").unwrap();
        std::fs::write(family.join("result_0_100.log"), "#header\n2ABC_0:1-2\t\t1\n").unwrap();
        std::fs::write(family.join("result_0.log"), "#header\n1s72_0:1-2\t\t1\n").unwrap();
        std::fs::write(family.join("result_custom.log"), "1S72_0:1-2\t\t1\n").unwrap();

        let chosen = select_result_file(family, "1S72").unwrap();
        assert_eq!(chosen.file_name().unwrap(), "result_0.log");

        std::fs::remove_file(family.join("result_0.log")).unwrap();
        let chosen = select_result_file(family, "1S72").unwrap();
        assert_eq!(chosen.file_name().unwrap(), "result_custom.log");

        assert!(select_result_file(family, "9ZZZ").is_none());
    }
}
