//! Multi-source reconciliation pipeline
//!
//! **Stages:**
//! 1. Validate the structure id and source selection
//! 2. Fetch each selected source in turn (a failing source degrades to empty)
//! 3. Enrich collections from generic-naming sources
//! 4. Cascade-merge in selection order (first selected wins)

use super::sources::{validate_selection, SourceId};
use crate::adapters::{BgsuHubSource, BundledSource, RfamApiSource, ToolFormat, UserToolSource, WebClient};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::reconcile::{CascadeMerger, HomologEnricher, RepresentativeIndex};
use crate::types::{MotifCollection, MotifSource, StructureId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Source set
// ============================================================================

/// Adapters available to the pipeline, keyed by registry id
#[derive(Default, Clone)]
pub struct SourceSet {
    sources: BTreeMap<SourceId, Arc<dyn MotifSource>>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: SourceId, source: Arc<dyn MotifSource>) -> Self {
        self.insert(id, source);
        self
    }

    pub fn insert(&mut self, id: SourceId, source: Arc<dyn MotifSource>) {
        self.sources.insert(id, source);
    }

    pub fn get(&self, id: SourceId) -> Option<&Arc<dyn MotifSource>> {
        self.sources.get(&id)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.sources.contains_key(&id)
    }

    /// Every registered adapter, built from configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let client = WebClient::new(&config.user_agent, config.request_timeout)?;
        let user_tool = |format: ToolFormat| -> Arc<dyn MotifSource> {
            Arc::new(
                UserToolSource::with_tool_dir(format, config.tool_dir(format))
                    .with_filter(config.filter_for(format)),
            )
        };

        Ok(Self::new()
            .with(SourceId::Atlas, Arc::new(BundledSource::atlas(&config.atlas_dir)))
            .with(SourceId::RfamLocal, Arc::new(BundledSource::rfam_local(&config.rfam_dir)))
            .with(
                SourceId::BgsuApi,
                Arc::new(BgsuHubSource::new(
                    client.clone(),
                    &config.bgsu_html_url,
                    &config.bgsu_loops_url,
                )),
            )
            .with(SourceId::RfamApi, Arc::new(RfamApiSource::new(client, &config.rfam_api_url)))
            .with(SourceId::Fr3d, user_tool(ToolFormat::Fr3d))
            .with(SourceId::RnaMotifScan, user_tool(ToolFormat::RnaMotifScan))
            .with(SourceId::RnaMotifScanX, user_tool(ToolFormat::RnaMotifScanX)))
    }
}

// ============================================================================
// Outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// At least one source returned motifs
    Merged,
    /// Every selected source was empty or failed
    AllSourcesEmpty,
}

/// What one source contributed before merging
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCount {
    pub id: u8,
    pub name: &'static str,
    pub categories: usize,
    pub instances: usize,
    pub failed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub structure_id: StructureId,
    pub motifs: MotifCollection,
    /// In selection order
    pub per_source_counts: Vec<SourceCount>,
    pub status: PipelineStatus,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Fetch, enrich and merge motifs for one structure
pub struct Pipeline {
    sources: SourceSet,
    enricher: Option<HomologEnricher>,
    merger: CascadeMerger,
}

impl Pipeline {
    /// Pipeline without enrichment
    pub fn new(sources: SourceSet, merger: CascadeMerger) -> Self {
        Self {
            sources,
            enricher: None,
            merger,
        }
    }

    pub fn with_enricher(mut self, enricher: HomologEnricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Build sources, representative index and enricher from configuration
    ///
    /// The enricher uses the BGSU adapter as its semantic annotator.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let sources = SourceSet::from_config(config)?;
        let merger = CascadeMerger::new(config.merge_threshold)?;
        let mut pipeline = Self::new(sources, merger);

        if config.enrichment_enabled {
            let index = Arc::new(RepresentativeIndex::load(&config.nr_list_path));
            if let Some(annotator) = pipeline.sources.get(SourceId::BgsuApi).cloned() {
                let enricher = HomologEnricher::new(index, annotator)
                    .with_threshold(config.enrich_threshold)?;
                pipeline = pipeline.with_enricher(enricher);
            }
        }
        Ok(pipeline)
    }

    /// Run the pipeline for one structure over the selected sources
    ///
    /// Selection order is merge priority. Invalid ids or selections are
    /// errors; source failures are not.
    pub async fn run(&self, structure: &str, selection: &[SourceId]) -> Result<PipelineOutcome> {
        let structure_id =
            StructureId::parse(structure).map_err(|e| Error::InvalidInput(e.to_string()))?;
        validate_selection(selection)?;
        if let Some(missing) = selection.iter().find(|id| !self.sources.contains(**id)) {
            return Err(Error::Config(format!("Source {} is not configured", missing)));
        }

        info!(
            structure = %structure_id,
            sources = ?selection.iter().map(|s| s.id()).collect::<Vec<_>>(),
            "Pipeline started"
        );

        let mut collections = Vec::with_capacity(selection.len());
        let mut per_source_counts = Vec::with_capacity(selection.len());
        for id in selection {
            let (collection, failed) = self.fetch(*id, &structure_id).await;
            per_source_counts.push(SourceCount {
                id: id.id(),
                name: id.display_name(),
                categories: collection.category_count(),
                instances: collection.total_instances(),
                failed,
            });
            collections.push(collection);
        }

        if collections.iter().all(MotifCollection::is_empty) {
            warn!(structure = %structure_id, "No selected source returned motifs");
            return Ok(PipelineOutcome {
                structure_id,
                motifs: MotifCollection::new(),
                per_source_counts,
                status: PipelineStatus::AllSourcesEmpty,
            });
        }

        if let Some(enricher) = &self.enricher {
            for (id, collection) in selection.iter().zip(collections.iter_mut()) {
                if id.uses_generic_names() && !collection.is_empty() {
                    debug!(source = id.display_name(), "Enriching generic categories");
                    *collection = enricher.enrich(&structure_id, collection).await;
                }
            }
        }

        let labels: Vec<String> = selection.iter().map(|s| s.display_name().to_string()).collect();
        let motifs = self.merger.merge(&collections, Some(labels.as_slice()));

        info!(
            structure = %structure_id,
            categories = motifs.category_count(),
            instances = motifs.total_instances(),
            "Pipeline complete"
        );
        Ok(PipelineOutcome {
            structure_id,
            motifs,
            per_source_counts,
            status: PipelineStatus::Merged,
        })
    }

    /// Fetch one source; failures are logged and read as empty
    async fn fetch(&self, id: SourceId, structure: &StructureId) -> (MotifCollection, bool) {
        let Some(source) = self.sources.get(id) else {
            return (MotifCollection::new(), true);
        };
        match source.get_motifs_for_structure(structure).await {
            Ok(collection) => {
                info!(
                    source = source.name(),
                    structure = %structure,
                    categories = collection.category_count(),
                    instances = collection.total_instances(),
                    "Source fetched"
                );
                (collection, false)
            }
            Err(e) => {
                warn!(source = source.name(), structure = %structure, error = %e, "Source failed; continuing without it");
                (MotifCollection::new(), true)
            }
        }
    }
}
