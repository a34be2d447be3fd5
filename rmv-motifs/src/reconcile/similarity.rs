//! Set similarity primitives

use std::collections::HashSet;
use std::hash::Hash;

/// Default Jaccard threshold for deduplication and residue fallback
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.60;

/// Jaccard index |A ∩ B| / |A ∪ B|
///
/// Returns 0.0 when either set is empty.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|x| large.contains(*x)).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Validate a similarity threshold: finite and within (0, 1]
pub fn validate_threshold(threshold: f64) -> Result<f64, String> {
    if threshold.is_finite() && threshold > 0.0 && threshold <= 1.0 {
        Ok(threshold)
    } else {
        Err(format!(
            "similarity threshold must be in (0, 1], got {}",
            threshold
        ))
    }
}
