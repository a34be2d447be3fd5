//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration lives in a single TOML file. Every field has a
//! built-in default, so a missing or partial file never prevents startup.
//!
//! Root folder resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `RMV_ROOT_FOLDER` environment variable
//! 3. `root_folder` key in the TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the data root folder
pub const ROOT_FOLDER_ENV: &str = "RMV_ROOT_FOLDER";

/// Application directory name used under the platform config/data dirs
pub const APP_DIR_NAME: &str = "rna-motif-visualizer";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Data root folder (bundled datasets, NR list, user annotations)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-source settings (endpoints, directories, p-value filters)
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Reconciliation thresholds
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Source endpoints and directories
///
/// Relative directories are resolved against the root folder by the
/// consuming crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// BGSU RNA 3D Hub HTML motif table base URL
    #[serde(default = "default_bgsu_html_url")]
    pub bgsu_html_url: String,

    /// BGSU RNA 3D Hub loop download (tabular) base URL
    #[serde(default = "default_bgsu_loops_url")]
    pub bgsu_loops_url: String,

    /// Rfam motif hits API base URL
    #[serde(default = "default_rfam_api_url")]
    pub rfam_api_url: String,

    /// Per-request timeout for web sources (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User-Agent header sent to web sources
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Bundled RNA 3D Motif Atlas dataset directory
    #[serde(default)]
    pub atlas_dir: Option<PathBuf>,

    /// Bundled Rfam dataset directory
    #[serde(default)]
    pub rfam_dir: Option<PathBuf>,

    /// Non-redundant equivalence class CSV
    #[serde(default)]
    pub nr_list_path: Option<PathBuf>,

    /// User annotation root (contains fr3d/, RNAMotifScan/, RNAMotifScanX/)
    #[serde(default)]
    pub user_annotations_dir: Option<PathBuf>,

    /// Per-tool scan root overrides, keyed by tool name (fr3d, rms, rmsx)
    #[serde(default)]
    pub tool_overrides: BTreeMap<String, PathBuf>,

    /// RNAMotifScan p-value filter settings
    #[serde(default)]
    pub rms_filter: PValueFilterConfig,

    /// RNAMotifScanX p-value filter settings
    #[serde(default)]
    pub rmsx_filter: PValueFilterConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            bgsu_html_url: default_bgsu_html_url(),
            bgsu_loops_url: default_bgsu_loops_url(),
            rfam_api_url: default_rfam_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            atlas_dir: None,
            rfam_dir: None,
            nr_list_path: None,
            user_annotations_dir: None,
            tool_overrides: BTreeMap::new(),
            rms_filter: PValueFilterConfig::default(),
            rmsx_filter: PValueFilterConfig::default(),
        }
    }
}

/// P-value filter toggle and per-family overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PValueFilterConfig {
    /// Apply the family p-value filter
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-family threshold overrides (family name → p-value)
    #[serde(default)]
    pub overrides: BTreeMap<String, f64>,
}

impl Default for PValueFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            overrides: BTreeMap::new(),
        }
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Jaccard threshold for cascade-merge deduplication
    #[serde(default = "default_similarity_threshold")]
    pub merge_threshold: f64,

    /// Jaccard threshold for the enricher's residue fallback
    #[serde(default = "default_similarity_threshold")]
    pub enrich_threshold: f64,

    /// Run homolog enrichment on generically-named sources
    #[serde(default = "default_true")]
    pub enrichment_enabled: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            merge_threshold: default_similarity_threshold(),
            enrich_threshold: default_similarity_threshold(),
            enrichment_enabled: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bgsu_html_url() -> String {
    "https://rna.bgsu.edu/rna3dhub/pdb".to_string()
}

fn default_bgsu_loops_url() -> String {
    "https://rna.bgsu.edu/rna3dhub/loops/download".to_string()
}

fn default_rfam_api_url() -> String {
    "https://rfam.org/motif/pdb".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "RNA-Motif-Visualizer/3.0".to_string()
}

fn default_similarity_threshold() -> f64 {
    0.60
}

fn default_true() -> bool {
    true
}

/// Default config file location (`~/.config/rna-motif-visualizer/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Load TOML config, falling back to defaults when the file is missing
///
/// A missing file is not an error (warning + defaults). A file that exists
/// but cannot be read or parsed is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}; using built-in defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write TOML config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;

    debug!("Wrote configuration to {}", path.display());
    Ok(())
}

/// Resolves the data root folder with a fixed priority order
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    /// Create resolver for a named module (used only for log context)
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            cli_arg: None,
            toml_root: None,
        }
    }

    /// Set command-line override (priority 1)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Set TOML-provided root folder (priority 3)
    pub fn with_toml_config(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    /// Resolve the root folder
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!(module = %self.module_name, "Root folder from command line: {}", path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!(module = %self.module_name, "Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            info!(module = %self.module_name, "Root folder from TOML: {}", path.display());
            return path.clone();
        }

        let path = default_root_folder();
        info!(module = %self.module_name, "Root folder from compiled default: {}", path.display());
        path
    }
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./rmv_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.sources.request_timeout_secs, 30);
        assert!((config.reconcile.merge_threshold - 0.60).abs() < f64::EPSILON);
        assert!(config.sources.rms_filter.enabled);
        assert!(config.sources.rmsx_filter.enabled);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [reconcile]
            merge_threshold = 0.75

            [sources.rmsx_filter]
            enabled = false
            overrides = { "C-LOOP" = 0.01 }
            "#,
        )
        .unwrap();

        assert!((config.reconcile.merge_threshold - 0.75).abs() < f64::EPSILON);
        assert!((config.reconcile.enrich_threshold - 0.60).abs() < f64::EPSILON);
        assert!(!config.sources.rmsx_filter.enabled);
        assert_eq!(config.sources.rmsx_filter.overrides.get("C-LOOP"), Some(&0.01));
        assert_eq!(config.sources.bgsu_html_url, "https://rna.bgsu.edu/rna3dhub/pdb");
    }

    #[test]
    fn test_cli_arg_has_highest_priority() {
        let toml = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        let resolved = RootFolderResolver::new("test")
            .with_cli_arg(Some(PathBuf::from("/from/cli")))
            .with_toml_config(&toml)
            .resolve();
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }
}
