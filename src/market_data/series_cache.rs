use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::types::{PriceSeries, SeriesKey};

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

/// One cached fetch result. Entries are never mutated; a refresh swaps in a
/// new `Arc<CacheEntry>`.
#[derive(Debug)]
pub struct CacheEntry {
    pub key: SeriesKey,
    pub series: Arc<PriceSeries>,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Fresh while strictly younger than its TTL; a zero TTL is never fresh.
    pub fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

// ---------------------------------------------------------------------------
// SeriesCache -- thread-safe map of (symbol, period) -> latest fetch
// ---------------------------------------------------------------------------

/// Shared cache of fetched price series.
///
/// Readers clone the `Arc` out under a read lock; writers replace the whole
/// entry under a write lock, so a reader never observes a half-written
/// series. Expired entries are dropped when looked up and swept on every
/// insert, so the map never outgrows the set of keys fetched within one TTL.
#[derive(Debug, Default)]
pub struct SeriesCache {
    entries: RwLock<HashMap<SeriesKey, Arc<CacheEntry>>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached series for `key` if it has not expired. A stale
    /// entry is removed.
    pub fn get_fresh(&self, key: &SeriesKey) -> Option<Arc<PriceSeries>> {
        let stale = {
            let map = self.entries.read();
            let entry = map.get(key)?;
            if entry.is_fresh() {
                return Some(Arc::clone(&entry.series));
            }
            Arc::clone(entry)
        };

        // Another writer may have refreshed the key between the two locks.
        let mut map = self.entries.write();
        if map.get(key).is_some_and(|current| Arc::ptr_eq(current, &stale)) {
            map.remove(key);
            debug!(key = %key, "expired series evicted");
        }
        None
    }

    /// Store `series` under `key` for `ttl`, replacing any previous entry and
    /// sweeping every other expired entry.
    pub fn insert(&self, key: SeriesKey, series: Arc<PriceSeries>, ttl: Duration) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry {
            key: key.clone(),
            series,
            fetched_at: Instant::now(),
            ttl,
        });

        let mut map = self.entries.write();
        let before = map.len();
        map.retain(|_, e| e.is_fresh());
        let swept = before - map.len();
        if swept > 0 {
            debug!(swept, "expired series swept");
        }
        map.insert(key, Arc::clone(&entry));
        entry
    }

    /// Current entry for `key` regardless of age.
    pub fn entry(&self, key: &SeriesKey) -> Option<Arc<CacheEntry>> {
        self.entries.read().get(key).cloned()
    }

    pub fn invalidate(&self, key: &SeriesKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
