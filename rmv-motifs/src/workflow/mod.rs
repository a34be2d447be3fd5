//! Pipeline orchestration and source registry

pub mod pipeline;
pub mod sources;

pub use pipeline::{Pipeline, PipelineOutcome, PipelineStatus, SourceCount, SourceSet};
pub use sources::{validate_selection, SourceId, SourceKind};
