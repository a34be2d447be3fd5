//! # rmv-motifs
//!
//! Multi-source RNA structural-motif reconciliation:
//! - Source adapters (BGSU RNA 3D Hub, Rfam, bundled datasets, user tools)
//! - Homolog enrichment of loop-class categories
//! - Priority cascade merge with Jaccard deduplication
//! - Pipeline orchestration over a numbered source registry

pub mod adapters;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod types;
pub mod workflow;

pub use error::{Error, Result};
pub use types::{MotifCollection, MotifInstance, MotifSource, ResidueSpec, SourceError, StructureId};
pub use workflow::{Pipeline, PipelineOutcome, PipelineStatus, SourceId};
