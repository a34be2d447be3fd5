//! Pipeline configuration
//!
//! Derives concrete paths, endpoints, filters and thresholds from the
//! shared [`TomlConfig`]. Relative directories are resolved against the
//! data root folder:
//!
//! ```text
//! {root}/atlas/                      bundled RNA 3D Motif Atlas
//! {root}/rfam/                       bundled Rfam
//! {root}/nrlist/nrlist_4.24_all.csv  equivalence classes
//! {root}/user_annotations/           fr3d/, RNAMotifScan/, RNAMotifScanX/
//! ```

use crate::adapters::user_tools::{PValueFilter, ToolFormat};
use crate::error::{Error, Result};
use crate::reconcile::similarity::validate_threshold;
use rmv_common::config::{PValueFilterConfig, TomlConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ATLAS_DIR: &str = "atlas";
pub const DEFAULT_RFAM_DIR: &str = "rfam";
pub const DEFAULT_NR_LIST: &str = "nrlist/nrlist_4.24_all.csv";
pub const DEFAULT_USER_ANNOTATIONS_DIR: &str = "user_annotations";

/// Validated pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub root_folder: PathBuf,

    pub bgsu_html_url: String,
    pub bgsu_loops_url: String,
    pub rfam_api_url: String,
    pub request_timeout: Duration,
    pub user_agent: String,

    pub atlas_dir: PathBuf,
    pub rfam_dir: PathBuf,
    pub nr_list_path: PathBuf,
    pub user_annotations_dir: PathBuf,
    /// Per-tool scan directory (override or `{user_annotations}/{tool dir}`)
    pub tool_dirs: HashMap<ToolFormat, PathBuf>,

    pub rms_filter: PValueFilter,
    pub rmsx_filter: PValueFilter,

    pub merge_threshold: f64,
    pub enrich_threshold: f64,
    pub enrichment_enabled: bool,
}

impl PipelineConfig {
    /// Build from TOML settings and the resolved root folder
    pub fn from_toml(config: &TomlConfig, root_folder: &Path) -> Result<Self> {
        let sources = &config.sources;
        let reconcile = &config.reconcile;

        let under_root = |path: &Path| -> PathBuf {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                root_folder.join(path)
            }
        };
        let resolve = |configured: &Option<PathBuf>, default: &str| -> PathBuf {
            under_root(configured.as_deref().unwrap_or(Path::new(default)))
        };

        let user_annotations_dir = resolve(&sources.user_annotations_dir, DEFAULT_USER_ANNOTATIONS_DIR);

        let mut tool_dirs: HashMap<ToolFormat, PathBuf> = ToolFormat::ALL
            .iter()
            .map(|format| (*format, user_annotations_dir.join(format.dir_name())))
            .collect();
        for (name, dir) in &sources.tool_overrides {
            let format = ToolFormat::from_name(name)
                .ok_or_else(|| Error::Config(format!("Unknown tool in tool_overrides: {}", name)))?;
            tool_dirs.insert(format, under_root(dir));
        }

        if sources.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".to_string()));
        }

        Ok(Self {
            root_folder: root_folder.to_path_buf(),
            bgsu_html_url: sources.bgsu_html_url.clone(),
            bgsu_loops_url: sources.bgsu_loops_url.clone(),
            rfam_api_url: sources.rfam_api_url.clone(),
            request_timeout: Duration::from_secs(sources.request_timeout_secs),
            user_agent: sources.user_agent.clone(),
            atlas_dir: resolve(&sources.atlas_dir, DEFAULT_ATLAS_DIR),
            rfam_dir: resolve(&sources.rfam_dir, DEFAULT_RFAM_DIR),
            nr_list_path: resolve(&sources.nr_list_path, DEFAULT_NR_LIST),
            user_annotations_dir,
            tool_dirs,
            rms_filter: build_filter(ToolFormat::RnaMotifScan, &sources.rms_filter)?,
            rmsx_filter: build_filter(ToolFormat::RnaMotifScanX, &sources.rmsx_filter)?,
            merge_threshold: validate_threshold(reconcile.merge_threshold)
                .map_err(|e| Error::Config(format!("merge_threshold: {}", e)))?,
            enrich_threshold: validate_threshold(reconcile.enrich_threshold)
                .map_err(|e| Error::Config(format!("enrich_threshold: {}", e)))?,
            enrichment_enabled: reconcile.enrichment_enabled,
        })
    }

    /// Scan directory for a tool
    pub fn tool_dir(&self, format: ToolFormat) -> PathBuf {
        self.tool_dirs
            .get(&format)
            .cloned()
            .unwrap_or_else(|| self.user_annotations_dir.join(format.dir_name()))
    }

    /// P-value filter for a tool (FR3D gets the no-op default)
    pub fn filter_for(&self, format: ToolFormat) -> PValueFilter {
        match format {
            ToolFormat::RnaMotifScan => self.rms_filter.clone(),
            ToolFormat::RnaMotifScanX => self.rmsx_filter.clone(),
            ToolFormat::Fr3d => PValueFilter::defaults(ToolFormat::Fr3d),
        }
    }
}

fn build_filter(format: ToolFormat, config: &PValueFilterConfig) -> Result<PValueFilter> {
    PValueFilter::new(
        format,
        config.enabled,
        config.overrides.iter().map(|(family, p)| (family.clone(), *p)),
    )
    .map_err(|e| Error::Config(format!("{} filter: {}", format, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_resolve_against_root() {
        let config = PipelineConfig::from_toml(&TomlConfig::default(), Path::new("/data/rmv")).unwrap();
        assert_eq!(config.atlas_dir, PathBuf::from("/data/rmv/atlas"));
        assert_eq!(config.nr_list_path, PathBuf::from("/data/rmv/nrlist/nrlist_4.24_all.csv"));
        assert_eq!(
            config.tool_dir(ToolFormat::RnaMotifScanX),
            PathBuf::from("/data/rmv/user_annotations/RNAMotifScanX")
        );
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_tool_override_replaces_directory() {
        let mut toml = TomlConfig::default();
        toml.sources.tool_overrides.insert("rms".to_string(), PathBuf::from("/scans/rms"));
        toml.sources.tool_overrides.insert("fr3d".to_string(), PathBuf::from("local_fr3d"));
        let config = PipelineConfig::from_toml(&toml, Path::new("/root")).unwrap();
        assert_eq!(config.tool_dir(ToolFormat::RnaMotifScan), PathBuf::from("/scans/rms"));
        assert_eq!(config.tool_dir(ToolFormat::Fr3d), PathBuf::from("/root/local_fr3d"));
    }

    #[test]
    fn test_unknown_tool_override_rejected() {
        let mut toml = TomlConfig::default();
        toml.sources.tool_overrides.insert("dssr".to_string(), PathBuf::from("/x"));
        assert!(matches!(
            PipelineConfig::from_toml(&toml, Path::new("/root")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        for bad in [0.0, -0.2, 1.5, f64::NAN] {
            let mut toml = TomlConfig::default();
            toml.reconcile.merge_threshold = bad;
            assert!(PipelineConfig::from_toml(&toml, Path::new("/root")).is_err());
        }
    }

    #[test]
    fn test_pvalue_override_applied_and_validated() {
        let mut toml = TomlConfig::default();
        toml.sources.rmsx_filter.overrides.insert("k-turn".to_string(), 0.2);
        let config = PipelineConfig::from_toml(&toml, Path::new("/root")).unwrap();
        assert_eq!(config.rmsx_filter.threshold_for("K-TURN"), Some(0.2));

        toml.sources.rms_filter.overrides.insert("C-LOOP".to_string(), -1.0);
        assert!(matches!(
            PipelineConfig::from_toml(&toml, Path::new("/root")),
            Err(Error::Config(_))
        ));
    }
}
