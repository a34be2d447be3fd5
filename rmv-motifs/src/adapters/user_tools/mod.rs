//! User-supplied annotation tool outputs
//!
//! Three offline scanners drop result files under one annotation root:
//!
//! ```text
//! {user_root}/
//! ├── fr3d/{pdb}*.csv|tsv|txt
//! ├── RNAMotifScan/{family}/Res_{pdb}
//! └── RNAMotifScanX/{family}/result_*.log
//! ```
//!
//! [`UserToolSource`] scans one tool directory per structure, parses every
//! matching file with the [`ToolFormat`] parser, applies the family p-value
//! filter and orders each category by alignment score. A missing tool
//! directory or structure yields an empty collection.

pub mod fr3d;
pub mod pvalue_filter;
pub mod rna_motif_scan;
pub mod rna_motif_scan_x;

pub use pvalue_filter::{default_threshold, sort_by_score_desc, PValueFilter};

use crate::adapters::patterns::{patterns, Patterns};
use crate::types::{MotifCollection, MotifSource, SourceError, StructureId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

// ============================================================================
// Tool formats
// ============================================================================

/// Supported annotation tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolFormat {
    Fr3d,
    RnaMotifScan,
    RnaMotifScanX,
}

impl ToolFormat {
    pub const ALL: [ToolFormat; 3] = [ToolFormat::Fr3d, ToolFormat::RnaMotifScan, ToolFormat::RnaMotifScanX];

    /// Directory name under the annotation root
    pub fn dir_name(&self) -> &'static str {
        match self {
            ToolFormat::Fr3d => "fr3d",
            ToolFormat::RnaMotifScan => "RNAMotifScan",
            ToolFormat::RnaMotifScanX => "RNAMotifScanX",
        }
    }

    /// Source name for provenance
    pub fn source_name(&self) -> &'static str {
        match self {
            ToolFormat::Fr3d => "FR3D",
            ToolFormat::RnaMotifScan => "RNAMotifScan",
            ToolFormat::RnaMotifScanX => "RNAMotifScanX",
        }
    }

    /// Parse a tool name (`fr3d`, `rms`, `rnamotifscan`, `rmsx`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "fr3d" => Some(ToolFormat::Fr3d),
            "rms" | "rnamotifscan" => Some(ToolFormat::RnaMotifScan),
            "rmsx" | "rnamotifscanx" => Some(ToolFormat::RnaMotifScanX),
            _ => None,
        }
    }

    /// Whether results carry p-values the family filter applies to
    pub fn has_p_values(&self) -> bool {
        !matches!(self, ToolFormat::Fr3d)
    }

    /// Parse every file for a structure below `tool_dir`, unfiltered
    ///
    /// Instances from several files in one category are concatenated in
    /// file-name order.
    pub fn parse_structure(&self, tool_dir: &Path, pdb_id: &str) -> MotifCollection {
        let mut collection = MotifCollection::new();
        let patterns = match patterns() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Pattern table unavailable");
                return collection;
            }
        };
        for (path, family) in self.result_files(tool_dir, pdb_id) {
            match self.parse_file(patterns, &path, family.as_deref(), pdb_id) {
                Ok(parsed) => {
                    debug!(
                        file = %path.display(),
                        instances = parsed.total_instances(),
                        "Parsed user annotation file"
                    );
                    for (category, instances) in parsed {
                        collection.extend_category(category, instances);
                    }
                }
                Err(e) => warn!(file = %path.display(), error = %e, "Failed to read user annotation file"),
            }
        }
        collection
    }

    /// Parse one result file
    ///
    /// `family` is required by the scan formats and ignored for FR3D, whose
    /// category comes from each row.
    pub fn parse_file(
        &self,
        patterns: &Patterns,
        path: &Path,
        family: Option<&str>,
        pdb_id: &str,
    ) -> std::io::Result<MotifCollection> {
        match self {
            ToolFormat::Fr3d => {
                let delimiter = match path.extension().and_then(|e| e.to_str()) {
                    Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
                    _ => b',',
                };
                let file = std::fs::File::open(path)?;
                Ok(fr3d::parse_table(file, delimiter, pdb_id))
            }
            ToolFormat::RnaMotifScan | ToolFormat::RnaMotifScanX => {
                let content = std::fs::read_to_string(path)?;
                let family = family.unwrap_or_default();
                let hits = if *self == ToolFormat::RnaMotifScan {
                    rna_motif_scan::parse_hits(patterns, &content, family, pdb_id)
                } else {
                    rna_motif_scan_x::parse_hits(patterns, &content, family, pdb_id)
                };
                let mut collection = MotifCollection::new();
                collection.extend_category(family, hits);
                Ok(collection)
            }
        }
    }

    /// Result files for a structure, with the family each belongs to
    fn result_files(&self, tool_dir: &Path, pdb_id: &str) -> Vec<(PathBuf, Option<String>)> {
        let lower = pdb_id.to_lowercase();
        match self {
            ToolFormat::Fr3d => sorted_entries(tool_dir)
                .into_iter()
                .filter(|path| path.is_file())
                .filter(|path| {
                    let ext_ok = path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| ["csv", "tsv", "txt"].contains(&e.to_lowercase().as_str()));
                    let stem_ok = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|s| s.to_lowercase().starts_with(&lower));
                    ext_ok && stem_ok
                })
                .map(|path| (path, None))
                .collect(),
            ToolFormat::RnaMotifScan => family_dirs(tool_dir)
                .into_iter()
                .filter_map(|(dir, folder)| {
                    let file = dir.join(format!("Res_{}", lower));
                    file.is_file()
                        .then(|| (file, Some(rna_motif_scan::family_from_folder(&folder))))
                })
                .collect(),
            ToolFormat::RnaMotifScanX => family_dirs(tool_dir)
                .into_iter()
                .filter_map(|(dir, folder)| {
                    rna_motif_scan_x::select_result_file(&dir, pdb_id)
                        .map(|file| (file, Some(rna_motif_scan_x::family_from_folder(&folder))))
                })
                .collect(),
        }
    }
}

impl fmt::Display for ToolFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .collect()
}

fn family_dirs(tool_dir: &Path) -> Vec<(PathBuf, String)> {
    sorted_entries(tool_dir)
        .into_iter()
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let folder = path.file_name()?.to_str()?.to_string();
            Some((path, folder))
        })
        .collect()
}

// ============================================================================
// Source
// ============================================================================

/// Adapter over one tool's result directory
pub struct UserToolSource {
    format: ToolFormat,
    tool_dir: PathBuf,
    filter: PValueFilter,
    cache: Mutex<HashMap<StructureId, MotifCollection>>,
}

impl UserToolSource {
    /// Source reading `{user_root}/{tool dir}` with default thresholds
    pub fn new(format: ToolFormat, user_root: &Path) -> Self {
        Self::with_tool_dir(format, user_root.join(format.dir_name()))
    }

    /// Source reading an explicit tool directory
    pub fn with_tool_dir(format: ToolFormat, tool_dir: impl Into<PathBuf>) -> Self {
        Self {
            format,
            tool_dir: tool_dir.into(),
            filter: PValueFilter::defaults(format),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_filter(mut self, filter: PValueFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn format(&self) -> ToolFormat {
        self.format
    }

    pub fn tool_dir(&self) -> &Path {
        &self.tool_dir
    }

    /// Filter and order each category
    fn finalize(&self, raw: MotifCollection) -> MotifCollection {
        raw.into_iter()
            .map(|(category, instances)| {
                let mut kept = if self.format.has_p_values() {
                    self.filter.apply(&category, instances)
                } else {
                    instances
                };
                sort_by_score_desc(&mut kept);
                (category, kept)
            })
            .filter(|(_, instances)| !instances.is_empty())
            .collect()
    }
}

#[async_trait]
impl MotifSource for UserToolSource {
    fn name(&self) -> &'static str {
        self.format.source_name()
    }

    async fn get_motifs_for_structure(
        &self,
        structure: &StructureId,
    ) -> Result<MotifCollection, SourceError> {
        if let Some(cached) = self.cache.lock().await.get(structure) {
            return Ok(cached.clone());
        }

        if !self.tool_dir.is_dir() {
            info!(
                source = self.name(),
                dir = %self.tool_dir.display(),
                "User annotation directory not present"
            );
            return Ok(MotifCollection::new());
        }

        let format = self.format;
        let tool_dir = self.tool_dir.clone();
        let pdb_id = structure.as_str().to_string();
        let raw = tokio::task::spawn_blocking(move || format.parse_structure(&tool_dir, &pdb_id))
            .await
            .map_err(|e| SourceError::Internal(format!("scan task failed: {}", e)))?;

        let parsed = raw.total_instances();
        let collection = self.finalize(raw);
        info!(
            source = self.name(),
            structure = %structure,
            parsed,
            kept = collection.total_instances(),
            categories = collection.category_count(),
            "Loaded user annotations"
        );
        self.cache.lock().await.insert(structure.clone(), collection.clone());
        Ok(collection)
    }
}
