//! Error types for rmv-motifs
//!
//! Source-level failures ([`SourceError`](crate::types::SourceError)) are
//! absorbed by the pipeline and degrade to empty collections. The errors
//! here are the ones a caller must see: rejected configuration and input.

use crate::types::SourceError;
use thiserror::Error;

/// Result alias for pipeline and configuration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration (threshold, source selection, p-value override)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Source failure surfaced to the caller
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// rmv-common error
    #[error("Common error: {0}")]
    Common(#[from] rmv_common::Error),
}
