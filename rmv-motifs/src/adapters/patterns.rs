//! Compiled regular expressions shared by the adapters
//!
//! Compiled once on first use. A compile failure is reported as
//! [`SourceError::Internal`] by every adapter that needs the set.

use crate::types::SourceError;
use once_cell::sync::Lazy;
use regex::Regex;

pub struct Patterns {
    /// `"LOOP_ID","RESIDUES"` pair in the loop download
    pub loop_row: Regex,
    /// `<tbody>` content
    pub tbody: Regex,
    /// `<tr>` content
    pub row: Regex,
    /// `<td>` content
    pub cell: Regex,
    /// Any markup tag
    pub tag: Regex,
    /// Loop id, e.g. `HL_4V9F_001`
    pub loop_id: Regex,
    /// Motif group id, e.g. `HL_34789.4`
    pub motif_group: Regex,
    /// `'chain'number` token in RNAMotifScan locations
    pub quoted_chain_number: Regex,
    /// Leading `start-end` of an RNAMotifScanX fragment range
    pub fragment_range: Regex,
    /// `i:'c'start-j:'c'end` RNAMotifScanX aligned region
    pub aligned_region: Regex,
}

static PATTERNS: Lazy<Result<Patterns, regex::Error>> = Lazy::new(|| {
    Ok(Patterns {
        loop_row: Regex::new(r#""([^"]+)","([^"]+)""#)?,
        tbody: Regex::new(r"(?is)<tbody[^>]*>(.*?)</tbody>")?,
        row: Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>")?,
        cell: Regex::new(r"(?is)<td[^>]*>(.*?)</td>")?,
        tag: Regex::new(r"(?s)<[^>]*>")?,
        loop_id: Regex::new(r"((?:HL|IL|J\d)_\S+_\d{3,4})")?,
        motif_group: Regex::new(r"((?:IL|HL|J\d)_\d+\.\d+)")?,
        quoted_chain_number: Regex::new(r"'([^']+)'(\d+)")?,
        fragment_range: Regex::new(r"^(\d+)-(\d+)")?,
        aligned_region: Regex::new(r"\d+:'[^']*'(\d+)-\d+:'[^']*'(\d+)")?,
    })
});

/// Shared pattern set
pub fn patterns() -> Result<&'static Patterns, SourceError> {
    PATTERNS
        .as_ref()
        .map_err(|e| SourceError::Internal(format!("pattern compile failed: {}", e)))
}

/// Strip markup and decode the common entities, then trim
pub fn html_text(patterns: &Patterns, fragment: &str) -> String {
    patterns
        .tag
        .replace_all(fragment, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
