//! Family-specific p-value filtering for motif-scan results
//!
//! Default thresholds are the published per-family significance cut-offs
//! for each scanner. Caller overrides replace the default for a family.
//! An instance survives iff `p_value <= threshold`; an instance without a
//! p-value is treated as p = 1.0.

use super::ToolFormat;
use crate::types::MotifInstance;
use std::collections::HashMap;

/// RNAMotifScanX default thresholds
const RMSX_THRESHOLDS: &[(&str, f64)] = &[
    ("KINK-TURN", 0.066),
    ("K-TURN", 0.066),
    ("C-LOOP", 0.044),
    ("SARCIN-RICIN", 0.040),
    ("REVERSE KINK-TURN", 0.018),
    ("REVERSE-KINK-TURN", 0.018),
    ("E-LOOP", 0.018),
];
const RMSX_FALLBACK: f64 = 0.05;

/// RNAMotifScan default thresholds (folder-name variants included)
const RMS_THRESHOLDS: &[(&str, f64)] = &[
    ("KINK-TURN", 0.07),
    ("K-TURN", 0.07),
    ("KTURN", 0.07),
    ("C-LOOP", 0.04),
    ("C_LOOP", 0.04),
    ("SARCIN-RICIN", 0.02),
    ("SARCIN_RICIN", 0.02),
    ("SARCIN\u{2013}RICIN", 0.02),
    ("REVERSE KINK-TURN", 0.14),
    ("REVERSE-KINK-TURN", 0.14),
    ("REVERSE_KINK_TURN", 0.14),
    ("REVERSE KTURN", 0.14),
    ("REVERSE_KTURN", 0.14),
    ("REVERSE-KTURN", 0.14),
    ("E-LOOP", 0.13),
    ("E_LOOP", 0.13),
];
const RMS_FALLBACK: f64 = 0.10;

/// Default threshold for a family; unknown families get the tool fallback
pub fn default_threshold(format: ToolFormat, family: &str) -> Option<f64> {
    let (table, fallback) = match format {
        ToolFormat::RnaMotifScan => (RMS_THRESHOLDS, RMS_FALLBACK),
        ToolFormat::RnaMotifScanX => (RMSX_THRESHOLDS, RMSX_FALLBACK),
        ToolFormat::Fr3d => return None,
    };
    let family = family.to_uppercase();
    Some(
        table
            .iter()
            .find(|(name, _)| *name == family)
            .map(|(_, t)| *t)
            .unwrap_or(fallback),
    )
}

/// Per-tool p-value filter settings
#[derive(Debug, Clone)]
pub struct PValueFilter {
    format: ToolFormat,
    enabled: bool,
    overrides: HashMap<String, f64>,
}

impl PValueFilter {
    /// Create filter; overrides must lie within [0, 1]
    pub fn new(
        format: ToolFormat,
        enabled: bool,
        overrides: impl IntoIterator<Item = (String, f64)>,
    ) -> Result<Self, String> {
        let mut validated = HashMap::new();
        for (family, threshold) in overrides {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(format!(
                    "p-value override for {} must be within [0, 1], got {}",
                    family, threshold
                ));
            }
            validated.insert(family.trim().to_uppercase(), threshold);
        }
        Ok(Self {
            format,
            enabled,
            overrides: validated,
        })
    }

    /// Filter with default thresholds only
    pub fn defaults(format: ToolFormat) -> Self {
        Self {
            format,
            enabled: true,
            overrides: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Threshold in effect for a family (`None` when the tool has no p-values)
    pub fn threshold_for(&self, family: &str) -> Option<f64> {
        self.overrides
            .get(&family.trim().to_uppercase())
            .copied()
            .or_else(|| default_threshold(self.format, family))
    }

    /// Keep instances at or below the family threshold
    pub fn apply(&self, family: &str, instances: Vec<MotifInstance>) -> Vec<MotifInstance> {
        if !self.enabled {
            return instances;
        }
        let Some(threshold) = self.threshold_for(family) else {
            return instances;
        };
        instances
            .into_iter()
            .filter(|i| i.p_value().unwrap_or(1.0) <= threshold)
            .collect()
    }
}

/// Score used for ordering: missing is 0.0, NaN sorts last
fn sort_key(instance: &MotifInstance) -> f64 {
    match instance.alignment_score() {
        Some(score) if score.is_nan() => f64::NEG_INFINITY,
        Some(score) => score,
        None => 0.0,
    }
}

/// Stable sort by alignment score, highest first
pub fn sort_by_score_desc(instances: &mut [MotifInstance]) {
    instances.sort_by(|a, b| sort_key(b).total_cmp(&sort_key(a)));
}
