//! Reconciliation stages
//!
//! - [`representative_set`] - member chain → representative chain index
//! - [`homolog_enricher`] - generic-name enrichment from representatives
//! - [`cascade_merger`] - priority-ordered Jaccard deduplication
//! - [`similarity`] / [`generic_category`] - shared primitives

pub mod cascade_merger;
pub mod generic_category;
pub mod homolog_enricher;
pub mod representative_set;
pub mod similarity;

pub use cascade_merger::CascadeMerger;
pub use generic_category::GenericCategory;
pub use homolog_enricher::HomologEnricher;
pub use representative_set::{RepresentativeEntry, RepresentativeIndex};
pub use similarity::{jaccard, DEFAULT_SIMILARITY_THRESHOLD};
