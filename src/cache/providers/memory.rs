//! In-memory cache store using Moka
//!
//! Per-process store with a per-entry TTL and a bounded entry count. Moka
//! evicts expired entries during its own housekeeping, so keys that are never
//! read again do not accumulate.
//!
//! **Important**: this cache is NOT distributed. Each process keeps its own
//! entries.

use crate::cache::traits::CacheStore;
use crate::constants::defaults;
use moka::sync::Cache;
use moka::Expiry;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedValue {
    value: Value,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct MemoryCacheStore {
    cache: Cache<String, CachedValue>,
}

impl fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("max_capacity", &self.cache.policy().max_capacity())
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::with_capacity(defaults::MEMORY_CACHE_MAX_CAPACITY)
    }
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding at most `max_capacity` entries.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        debug!(max_capacity = max_capacity, "Moka in-memory cache store created");

        Self { cache }
    }

    /// Number of live entries, after pending evictions have been applied.
    pub fn len(&self) -> usize {
        self.cache.run_pending_tasks();
        self.cache.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl CacheStore for MemoryCacheStore {
    fn try_get(&self, key: &str) -> Option<Value> {
        let hit = self.cache.get(key).map(|entry| entry.value);

        if hit.is_some() {
            debug!(key = key, "Cache HIT (moka)");
        } else {
            debug!(key = key, "Cache MISS (moka)");
        }
        hit
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        let ttl = ttl.min(Duration::from_secs(defaults::MAX_DURATION_SECONDS));
        self.cache
            .insert(key.to_string(), CachedValue { value, ttl });
        debug!(key = key, ttl_ms = ttl.as_millis() as u64, "Cache SET (moka)");
    }

    fn invalidate(&self, key: &str) {
        self.cache.invalidate(key);
        debug!(key = key, "Cache DEL (moka)");
    }

    fn provider_name(&self) -> &'static str {
        "moka"
    }
}
