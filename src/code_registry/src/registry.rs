//! The registry facade: one source, one cache.

use std::{sync::Arc, time::Duration};

use tracing::info;

use crate::{
    cache::MappingCache,
    errors::RegistryError,
    mapping::CodeMapping,
    sources::{MappingSource, SourceKind, SourceOptions, build_source, static_table::StaticTableSource},
};

/// Resolves source URLs to cached [`CodeMapping`]s.
pub struct CodeRegistry {
    source: Box<dyn MappingSource>,
    cache: MappingCache,
}

impl CodeRegistry {
    /// Registry over `source` whose entries live for `ttl` (`None` = forever).
    pub fn new(source: impl MappingSource + 'static, ttl: Option<Duration>) -> Self {
        Self::with_cache(Box::new(source), MappingCache::new(ttl))
    }

    /// Registry over an already boxed source and an explicit cache.
    pub fn with_cache(source: Box<dyn MappingSource>, cache: MappingCache) -> Self {
        Self { source, cache }
    }

    /// Registry backed by the bundled static table, never expiring.
    pub fn bundled() -> Result<Self, RegistryError> {
        Ok(Self::new(StaticTableSource::bundled()?, None))
    }

    /// Builds the source for `kind` and wraps it with a cache.
    pub fn from_kind(
        kind: SourceKind,
        opts: &SourceOptions,
        ttl: Option<Duration>,
    ) -> Result<Self, RegistryError> {
        info!(?kind, ?ttl, "building code registry");
        Ok(Self::with_cache(build_source(kind, opts)?, MappingCache::new(ttl)))
    }

    /// Returns the mapping published at `url`, fetching it at most once per
    /// cache lifetime.
    ///
    /// Errors:
    /// - [`RegistryError::SourceUnavailable`] if the page cannot be fetched
    ///   or does not contain a well-formed table.
    pub async fn fetch_mapping(&self, url: &str) -> Result<Arc<CodeMapping>, RegistryError> {
        self.cache.get_or_fetch(url, self.source.as_ref()).await
    }

    /// Drops the cached mapping for `url`.
    pub fn invalidate(&self, url: &str) -> bool {
        self.cache.invalidate(url)
    }

    /// The underlying cache.
    pub fn cache(&self) -> &MappingCache {
        &self.cache
    }
}
