//! In-memory motif source

use async_trait::async_trait;
use rmv_motifs::{MotifCollection, MotifSource, SourceError, StructureId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves canned collections keyed by upper-case structure id
pub struct StaticSource {
    name: &'static str,
    data: HashMap<String, MotifCollection>,
    fail: bool,
    fail_first: usize,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            data: HashMap::new(),
            fail: false,
            fail_first: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_structure(mut self, structure: &str, collection: MotifCollection) -> Self {
        self.data.insert(structure.to_ascii_uppercase(), collection);
        self
    }

    /// Every call fails as if the source were unreachable
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// The first `n` calls fail, later calls succeed
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MotifSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn get_motifs_for_structure(
        &self,
        structure: &StructureId,
    ) -> Result<MotifCollection, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail || call < self.fail_first {
            return Err(SourceError::Unreachable(format!("{} offline", self.name)));
        }
        Ok(self.data.get(structure.as_str()).cloned().unwrap_or_default())
    }
}
