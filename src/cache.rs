//! Explicit pipeline-result caching.
//!
//! The cache is deliberately not a memoization layer: keys are built from the
//! full set of pipeline inputs (file-set fingerprint, roster candidates, both
//! flags, decimal style) and invalidation is an explicit caller decision.
//! A changed file *set* misses naturally; content changes under unchanged
//! names are exactly what `invalidate`/`clear` exist for.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::data::provider::ResourceProvider;
use crate::domain::{DecimalStyle, IngestOptions};
use crate::error::AppError;
use crate::io::ingest::{IngestOutput, ingest};

/// Full input signature of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    file_set_fingerprint: u64,
    roster_candidates: Vec<String>,
    include_aggregates: bool,
    prefer_alias: bool,
    decimal_style: DecimalStyle,
}

impl CacheKey {
    /// Build the key for a provider/options pair (lists the provider).
    pub fn for_run(
        provider: &dyn ResourceProvider,
        options: &IngestOptions,
    ) -> Result<Self, AppError> {
        let names = provider.list()?;
        let mut hasher = DefaultHasher::new();
        provider.describe().hash(&mut hasher);
        names.hash(&mut hasher);
        Ok(Self {
            file_set_fingerprint: hasher.finish(),
            roster_candidates: options.roster_candidates.clone(),
            include_aggregates: options.include_aggregates,
            prefer_alias: options.prefer_alias,
            decimal_style: options.decimal_style,
        })
    }
}

/// Caller-owned cache of ingest results.
#[derive(Default)]
pub struct PipelineCache {
    entries: HashMap<CacheKey, Arc<IngestOutput>>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the pipeline through the cache: identical inputs return the
    /// previously computed table without touching the file contents again.
    pub fn get_or_ingest(
        &mut self,
        provider: &dyn ResourceProvider,
        options: &IngestOptions,
    ) -> Result<Arc<IngestOutput>, AppError> {
        let key = CacheKey::for_run(provider, options)?;
        if let Some(hit) = self.entries.get(&key) {
            return Ok(Arc::clone(hit));
        }
        let output = Arc::new(ingest(provider, options)?);
        self.entries.insert(key, Arc::clone(&output));
        Ok(output)
    }

    /// Drop one cached result.
    pub fn invalidate(&mut self, key: &CacheKey) {
        self.entries.remove(key);
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::local::LocalDirProvider;
    use std::fs;

    #[test]
    fn identical_inputs_hit_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "Fecha;Entidad;X\n202504;11;1\n").unwrap();

        let provider = LocalDirProvider::new(dir.path());
        let options = IngestOptions::default();
        let mut cache = PipelineCache::new();

        let first = cache.get_or_ingest(&provider, &options).unwrap();
        let second = cache.get_or_ingest(&provider, &options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_flags_or_file_set_miss() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "Fecha;Entidad;X\n202504;11;1\n").unwrap();

        let provider = LocalDirProvider::new(dir.path());
        let mut options = IngestOptions::default();
        let mut cache = PipelineCache::new();

        cache.get_or_ingest(&provider, &options).unwrap();
        options.include_aggregates = true;
        cache.get_or_ingest(&provider, &options).unwrap();
        assert_eq!(cache.len(), 2);

        fs::write(dir.path().join("b.csv"), "Fecha;Entidad;X\n202505;11;2\n").unwrap();
        cache.get_or_ingest(&provider, &options).unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn invalidation_is_explicit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "Fecha;Entidad;X\n202504;11;1\n").unwrap();

        let provider = LocalDirProvider::new(dir.path());
        let options = IngestOptions::default();
        let mut cache = PipelineCache::new();

        cache.get_or_ingest(&provider, &options).unwrap();
        let key = CacheKey::for_run(&provider, &options).unwrap();
        cache.invalidate(&key);
        assert!(cache.is_empty());
    }
}
