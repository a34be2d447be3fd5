//! Motif and file fixtures

use rmv_motifs::types::meta;
use rmv_motifs::{MotifCollection, MotifInstance, ResidueSpec};
use std::ops::RangeInclusive;
use std::path::Path;

/// Instance on one chain covering an inclusive residue range
pub fn instance(id: &str, category: &str, chain: &str, range: RangeInclusive<i32>) -> MotifInstance {
    let residues = range.map(|n| ResidueSpec::new(chain, n)).collect();
    MotifInstance::new(id, category, "1ABC", residues)
}

/// Instance carrying a motif-group id
pub fn grouped(id: &str, category: &str, chain: &str, range: RangeInclusive<i32>, group: &str) -> MotifInstance {
    instance(id, category, chain, range).with_meta(meta::MOTIF_GROUP, group)
}

/// Collection from (category, instance) pairs
pub fn collection(items: Vec<(&str, MotifInstance)>) -> MotifCollection {
    let mut c = MotifCollection::new();
    for (category, inst) in items {
        c.insert_instance(category, inst);
    }
    c
}

/// Write a file, creating parent directories
pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}
