//! Read-mostly cache of code mappings keyed by source URL.
//!
//! Readers load an `Arc<HashMap<..>>` snapshot with no locking. A miss takes
//! the fill lock, re-checks the snapshot and only then calls the source, so
//! concurrent callers asking for the same URL share one fetch. Writers swap in
//! a new snapshot; readers see either the old or the new one.
//!
//! Entries expire after the configured TTL (`None` keeps them for the life of
//! the cache). Failed fetches are never cached.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{errors::RegistryError, mapping::CodeMapping, sources::MappingSource};

#[derive(Debug)]
struct CachedMapping {
    mapping: Arc<CodeMapping>,
    fetched_at: Instant,
}

/// Snapshot type held inside the cache.
type Entries = HashMap<String, Arc<CachedMapping>>;

/// Per-URL cache of [`CodeMapping`]s with a time-to-live.
pub struct MappingCache {
    ttl: Option<Duration>,
    entries: ArcSwap<Entries>,
    fill: Mutex<()>,
}

impl MappingCache {
    /// Creates an empty cache. `ttl = None` never expires entries.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: ArcSwap::from_pointee(Entries::new()),
            fill: Mutex::new(()),
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns the cached mapping for `url` if present and not expired.
    pub fn get(&self, url: &str) -> Option<Arc<CodeMapping>> {
        let snap = self.entries.load();
        let entry = snap.get(url)?;
        if self.is_fresh(entry) {
            Some(Arc::clone(&entry.mapping))
        } else {
            debug!(url, "cached code mapping expired");
            None
        }
    }

    /// Returns the cached mapping for `url`, fetching it from `source` on a
    /// miss or after expiry.
    pub async fn get_or_fetch<S>(
        &self,
        url: &str,
        source: &S,
    ) -> Result<Arc<CodeMapping>, RegistryError>
    where
        S: MappingSource + ?Sized,
    {
        if let Some(mapping) = self.get(url) {
            debug!(url, "code mapping cache hit");
            return Ok(mapping);
        }

        let _guard = self.fill.lock().await;
        // Another caller may have filled it while we waited.
        if let Some(mapping) = self.get(url) {
            debug!(url, "code mapping filled by concurrent caller");
            return Ok(mapping);
        }

        debug!(url, "code mapping cache miss");
        let mapping = Arc::new(source.fetch(url).await?);
        self.insert(url, Arc::clone(&mapping));
        Ok(mapping)
    }

    /// Stores `mapping` for `url`, replacing any previous entry.
    pub fn insert(&self, url: &str, mapping: Arc<CodeMapping>) {
        let entry = Arc::new(CachedMapping {
            mapping,
            fetched_at: Instant::now(),
        });
        self.entries.rcu(|old| {
            let mut next = Entries::clone(old);
            next.insert(url.to_string(), Arc::clone(&entry));
            next
        });
    }

    /// Drops the entry for `url`. Returns `true` if one was present.
    pub fn invalidate(&self, url: &str) -> bool {
        let prev = self.entries.rcu(|old| {
            let mut next = Entries::clone(old);
            next.remove(url);
            next
        });
        prev.contains_key(url)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.store(Arc::new(Entries::new()));
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// Sorted list of URLs with a stored entry.
    pub fn cached_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.entries.load().keys().cloned().collect();
        urls.sort();
        urls
    }

    fn is_fresh(&self, entry: &CachedMapping) -> bool {
        self.ttl.is_none_or(|ttl| entry.fetched_at.elapsed() < ttl)
    }
}

impl Default for MappingCache {
    fn default() -> Self {
        Self::new(None)
    }
}
