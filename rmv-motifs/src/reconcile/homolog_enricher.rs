//! Homolog enricher
//!
//! Replaces loop-class category names (HL, IL, J3, ...) with the semantic
//! name the structure's non-redundant representative carries for the same
//! motif.
//!
//! # Pipeline
//! 1. Query structure → representative index → representative structures
//! 2. Fetch each representative's annotations from the semantic annotator
//! 3. Build `motif_group → category` from the representative's specific
//!    (non-generic) categories
//! 4. Per generic instance:
//!    - motif-group hit in any representative lookup → renamed copy
//!    - else, on chains that are their own representative, best residue
//!      Jaccard against specific representative instances (≥ threshold)
//!    - else keep the original category
//!
//! Residues are never changed; only `motif_id`, `annotation` and two
//! provenance metadata keys differ on an enriched copy.

use super::generic_category::GenericCategory;
use super::representative_set::RepresentativeIndex;
use super::similarity::{jaccard, validate_threshold, DEFAULT_SIMILARITY_THRESHOLD};
use crate::error::{Error, Result};
use crate::types::{meta, MotifCollection, MotifInstance, MotifSource, StructureId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Value of `enrichment_source` on renamed instances
pub const ENRICHMENT_SOURCE_HOMOLOG: &str = "homolog";

/// Annotations fetched for one representative structure
#[derive(Debug, Clone, Default)]
struct RepresentativeAnnotations {
    motifs: MotifCollection,
    /// motif_group → specific category
    group_lookup: HashMap<String, String>,
}

impl RepresentativeAnnotations {
    fn from_motifs(motifs: MotifCollection) -> Self {
        let mut group_lookup = HashMap::new();
        for (category, instances) in motifs.iter() {
            if GenericCategory::is_generic(category) {
                continue;
            }
            for inst in instances {
                if let Some(group) = inst.motif_group() {
                    group_lookup.insert(group.to_string(), category.clone());
                }
            }
        }
        Self {
            motifs,
            group_lookup,
        }
    }
}

#[derive(Debug, Default)]
struct EnrichmentStats {
    total: usize,
    generic: usize,
    enriched: usize,
    kept_generic: usize,
}

/// Generic-name enrichment from representative homologs
pub struct HomologEnricher {
    index: Arc<RepresentativeIndex>,
    annotator: Arc<dyn MotifSource>,
    threshold: f64,
    cache: Mutex<HashMap<String, Arc<RepresentativeAnnotations>>>,
}

impl HomologEnricher {
    /// Create enricher with the default residue-fallback threshold
    pub fn new(index: Arc<RepresentativeIndex>, annotator: Arc<dyn MotifSource>) -> Self {
        Self {
            index,
            annotator,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Set residue-fallback Jaccard threshold (finite, within (0, 1])
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        self.threshold = validate_threshold(threshold).map_err(Error::Config)?;
        Ok(self)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Return a copy of `motifs` with generic categories renamed where possible
    pub async fn enrich(&self, structure: &StructureId, motifs: &MotifCollection) -> MotifCollection {
        let chain_reps = self.index.get_all_representatives(structure.as_str());
        if chain_reps.is_empty() {
            info!(structure = %structure, "Not in representative list; enrichment skipped");
            return motifs.clone();
        }
        debug!(structure = %structure, chains = chain_reps.len(), "Representative chain mappings");

        let rep_structures: BTreeSet<&str> = chain_reps.values().map(|(s, _)| s.as_str()).collect();
        let mut reps: BTreeMap<String, Arc<RepresentativeAnnotations>> = BTreeMap::new();
        for rep in rep_structures {
            reps.insert(rep.to_string(), self.representative_annotations(rep).await);
        }

        if reps.values().all(|r| r.group_lookup.is_empty()) {
            info!(structure = %structure, "No representative group lookups available");
            return motifs.clone();
        }

        let mut enriched = MotifCollection::new();
        let mut stats = EnrichmentStats::default();

        for (category, instances) in motifs.iter() {
            let is_generic = GenericCategory::is_generic(category);
            for instance in instances {
                stats.total += 1;
                if !is_generic {
                    enriched.insert_instance(category.clone(), instance.clone());
                    continue;
                }
                stats.generic += 1;

                match self.find_homolog_name(instance, structure, &chain_reps, &reps) {
                    Some(name) if name != *category => {
                        stats.enriched += 1;
                        enriched.insert_instance(name.clone(), renamed(instance, &name, category));
                    }
                    _ => {
                        stats.kept_generic += 1;
                        enriched.insert_instance(category.clone(), instance.clone());
                    }
                }
            }
        }

        info!(
            structure = %structure,
            total = stats.total,
            generic = stats.generic,
            enriched = stats.enriched,
            kept_generic = stats.kept_generic,
            "Homolog enrichment complete"
        );
        enriched
    }

    /// Fetch and index a representative's annotations
    ///
    /// Only non-empty annotation sets are cached; a failed or empty fetch is
    /// retried on the next call.
    async fn representative_annotations(&self, rep: &str) -> Arc<RepresentativeAnnotations> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(rep) {
            return Arc::clone(cached);
        }

        let motifs = match StructureId::parse(rep) {
            Ok(rep_id) => match self.annotator.get_motifs_for_structure(&rep_id).await {
                Ok(motifs) => motifs,
                Err(e) => {
                    warn!(
                        representative = %rep,
                        source = self.annotator.name(),
                        error = %e,
                        "Representative annotations unavailable"
                    );
                    MotifCollection::new()
                }
            },
            Err(e) => {
                warn!(representative = %rep, error = %e, "Unusable representative id");
                MotifCollection::new()
            }
        };

        let annotations = Arc::new(RepresentativeAnnotations::from_motifs(motifs));
        info!(
            representative = %rep,
            groups = annotations.group_lookup.len(),
            "Built representative group lookup"
        );
        if !annotations.motifs.is_empty() {
            cache.insert(rep.to_string(), Arc::clone(&annotations));
        }
        annotations
    }

    fn find_homolog_name(
        &self,
        instance: &MotifInstance,
        structure: &StructureId,
        chain_reps: &BTreeMap<String, (String, String)>,
        reps: &BTreeMap<String, Arc<RepresentativeAnnotations>>,
    ) -> Option<String> {
        if let Some(group) = instance.motif_group() {
            for (rep_structure, _) in chain_reps.values() {
                if let Some(name) = reps.get(rep_structure).and_then(|r| r.group_lookup.get(group)) {
                    debug!(
                        instance = %instance.instance_id,
                        motif_group = %group,
                        name = %name,
                        "Motif-group match"
                    );
                    return Some(name.clone());
                }
            }
        }

        self.jaccard_fallback(instance, structure, chain_reps, reps)
    }

    /// Residue-number match on chains that represent themselves
    ///
    /// Numbering is only comparable when member and representative are the
    /// same chain, so other chains are skipped.
    fn jaccard_fallback(
        &self,
        instance: &MotifInstance,
        structure: &StructureId,
        chain_reps: &BTreeMap<String, (String, String)>,
        reps: &BTreeMap<String, Arc<RepresentativeAnnotations>>,
    ) -> Option<String> {
        let mut best: Option<(f64, &str)> = None;

        for chain in instance.chains() {
            let Some((rep_structure, rep_chain)) = chain_reps.get(chain) else {
                continue;
            };
            if !self.index.is_self_representative(structure.as_str(), chain) {
                continue;
            }
            let Some(rep) = reps.get(rep_structure) else {
                continue;
            };

            let member_residues = instance.residue_numbers_on_chain(chain);
            if member_residues.is_empty() {
                continue;
            }

            for (rep_category, rep_instances) in rep.motifs.iter() {
                if GenericCategory::is_generic(rep_category) {
                    continue;
                }
                for rep_instance in rep_instances {
                    let rep_residues = rep_instance.residue_numbers_on_chain(rep_chain);
                    if rep_residues.is_empty() {
                        continue;
                    }
                    let score = jaccard(&member_residues, &rep_residues);
                    let best_score = best.map(|(s, _)| s).unwrap_or(0.0);
                    if score >= self.threshold && score > best_score {
                        best = Some((score, rep_category.as_str()));
                    }
                }
            }
        }

        best.map(|(score, name)| {
            debug!(
                instance = %instance.instance_id,
                name = %name,
                jaccard = score,
                "Residue fallback match"
            );
            name.to_string()
        })
    }
}

fn renamed(instance: &MotifInstance, name: &str, original_category: &str) -> MotifInstance {
    let mut copy = instance.clone();
    copy.motif_id = name.to_string();
    copy.annotation = name.to_string();
    copy.metadata
        .insert(meta::ENRICHED_FROM.to_string(), original_category.into());
    copy.metadata.insert(
        meta::ENRICHMENT_SOURCE.to_string(),
        ENRICHMENT_SOURCE_HOMOLOG.into(),
    );
    copy
}
