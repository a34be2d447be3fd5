//! Cascade merger
//!
//! Merges N collections ordered by priority (index 0 highest) into one
//! deduplicated collection.
//!
//! # Algorithm
//! Right-to-left: the lowest-priority collection is the initial result,
//! then each higher-priority collection becomes the reference and the
//! running result is merged into it:
//!
//! ```text
//! result = C[n-1]
//! for i in n-2 ..= 0:  result = pairwise_merge(reference: C[i], updater: result)
//! ```
//!
//! `pairwise_merge` keeps every reference instance. An updater instance is
//! discarded when its residue-identity set reaches the Jaccard threshold
//! against any reference instance, in any category; otherwise it is kept
//! under its own category. Updater instances with no residues are always
//! kept. All category keys in a merged result are upper-cased.

use super::similarity::{jaccard, validate_threshold, DEFAULT_SIMILARITY_THRESHOLD};
use crate::error::{Error, Result};
use crate::types::{MotifCollection, ResidueKey};
use std::collections::HashSet;
use tracing::{debug, info};

/// Priority-ordered Jaccard deduplication
#[derive(Debug, Clone, Copy)]
pub struct CascadeMerger {
    threshold: f64,
}

impl Default for CascadeMerger {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Reference instance prepared for overlap checks
struct ReferenceSet<'a> {
    category: &'a str,
    instance_id: &'a str,
    residues: HashSet<ResidueKey>,
}

impl CascadeMerger {
    /// Create merger; threshold must be finite and within (0, 1]
    pub fn new(threshold: f64) -> Result<Self> {
        let threshold = validate_threshold(threshold).map_err(Error::Config)?;
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Merge collections in priority order (index 0 wins)
    ///
    /// `labels`, when given, name each input in the log output.
    pub fn merge(&self, inputs: &[MotifCollection], labels: Option<&[String]>) -> MotifCollection {
        let label = |i: usize| -> String {
            labels
                .and_then(|l| l.get(i))
                .cloned()
                .unwrap_or_else(|| format!("source[{}]", i))
        };

        let Some((last, rest)) = inputs.split_last() else {
            return MotifCollection::new();
        };
        if rest.is_empty() {
            return last.clone();
        }

        let mut result = last.clone();
        let mut result_label = label(inputs.len() - 1);
        for (i, reference) in rest.iter().enumerate().rev() {
            let reference_label = label(i);
            debug!(
                reference = %reference_label,
                updater = %result_label,
                "Cascade step"
            );
            result = self.pairwise_merge_labelled(reference, &result, &reference_label, &result_label);
            result_label = format!("{}+{}", reference_label, result_label);
        }

        info!(
            inputs = inputs.len(),
            categories = result.category_count(),
            instances = result.total_instances(),
            threshold = self.threshold,
            "Cascade merge complete"
        );
        result
    }

    /// Merge `updater` into `reference`; reference instances always survive
    pub fn pairwise_merge(&self, reference: &MotifCollection, updater: &MotifCollection) -> MotifCollection {
        self.pairwise_merge_labelled(reference, updater, "reference", "updater")
    }

    fn pairwise_merge_labelled(
        &self,
        reference: &MotifCollection,
        updater: &MotifCollection,
        reference_label: &str,
        updater_label: &str,
    ) -> MotifCollection {
        let mut merged = MotifCollection::new();
        for (category, instances) in reference.iter() {
            merged.extend_category(category.to_uppercase(), instances.clone());
        }

        let reference_sets: Vec<ReferenceSet<'_>> = reference
            .iter()
            .flat_map(|(category, instances)| {
                instances.iter().map(move |inst| ReferenceSet {
                    category: category.as_str(),
                    instance_id: inst.instance_id.as_str(),
                    residues: inst.residue_key_set(),
                })
            })
            .filter(|r| !r.residues.is_empty())
            .collect();

        let mut kept = 0usize;
        let mut discarded = 0usize;

        for (category, instances) in updater.iter() {
            let key = category.to_uppercase();
            for instance in instances {
                let residues = instance.residue_key_set();
                if residues.is_empty() {
                    merged.insert_instance(key.clone(), instance.clone());
                    kept += 1;
                    continue;
                }

                // First qualifying reference decides; no best-match search
                let overlap = reference_sets.iter().find_map(|r| {
                    let score = jaccard(&residues, &r.residues);
                    (score >= self.threshold).then_some((r, score))
                });

                match overlap {
                    Some((r, score)) => {
                        debug!(
                            instance = %instance.instance_id,
                            category = %category,
                            matched = %r.instance_id,
                            matched_category = %r.category,
                            jaccard = score,
                            "Discarding overlapping instance"
                        );
                        discarded += 1;
                    }
                    None => {
                        merged.insert_instance(key.clone(), instance.clone());
                        kept += 1;
                    }
                }
            }
        }

        info!(
            reference = %reference_label,
            updater = %updater_label,
            kept,
            discarded,
            "Pairwise merge"
        );
        merged
    }
}
