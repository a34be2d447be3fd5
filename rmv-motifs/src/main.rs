//! rmv-motifs - reconcile motif annotations for one structure
//!
//! Fetches the selected sources in priority order, enriches loop-class
//! categories from representative homologs, merges, and prints the outcome
//! as JSON on stdout. Logs go to stderr (or the configured log file).

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use rmv_common::config::{self, LoggingConfig, RootFolderResolver, TomlConfig};
use rmv_motifs::config::PipelineConfig;
use rmv_motifs::{Pipeline, PipelineStatus, SourceId};
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for rmv-motifs
#[derive(Parser, Debug)]
#[command(name = "rmv-motifs")]
#[command(about = "Reconcile RNA structural motifs across annotation sources")]
#[command(version)]
struct Args {
    /// Data root folder (bundled datasets, NR list, user annotations)
    #[arg(short, long, env = "RMV_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip homolog enrichment regardless of configuration
    #[arg(long)]
    no_enrichment: bool,

    /// Print compact rather than pretty JSON
    #[arg(long)]
    compact: bool,

    /// Structure id (4 characters, e.g. 1S72)
    structure: String,

    /// Sources in priority order: ids 1-7 or names
    /// (atlas, rfam, bgsu, rfam_api, fr3d, rms, rmsx)
    #[arg(required = true, num_args = 1..)]
    sources: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(config::default_config_path);
    let toml_config = match &config_path {
        Some(path) => config::load_toml_config(path)?,
        None => TomlConfig::default(),
    };

    init_tracing(&toml_config.logging)?;

    info!(
        "Starting rmv-motifs v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    // Env var is read by clap; the resolver then falls back to TOML and default
    let root_folder = RootFolderResolver::new("rmv-motifs")
        .with_cli_arg(args.root_folder.clone())
        .with_toml_config(&toml_config)
        .resolve();
    if !root_folder.is_dir() {
        warn!("Root folder {} does not exist; local sources will be empty", root_folder.display());
    }

    let mut pipeline_config = PipelineConfig::from_toml(&toml_config, &root_folder)
        .context("Invalid configuration")?;
    if args.no_enrichment {
        pipeline_config.enrichment_enabled = false;
    }

    let selection = args
        .sources
        .iter()
        .map(|token| SourceId::parse_list(token))
        .collect::<rmv_motifs::Result<Vec<Vec<SourceId>>>>()?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

    let pipeline = Pipeline::from_config(&pipeline_config).context("Failed to build pipeline")?;
    let outcome = pipeline.run(&args.structure, &selection).await?;

    if outcome.status == PipelineStatus::AllSourcesEmpty {
        warn!(structure = %outcome.structure_id, "No motifs found in any selected source");
    }

    let json = if args.compact {
        serde_json::to_string(&outcome)?
    } else {
        serde_json::to_string_pretty(&outcome)?
    };
    println!("{}", json);
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let writer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();
    Ok(())
}
