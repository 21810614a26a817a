//! No-op cache store
//!
//! Always misses. Swap it in to turn caching off without editing policies.

use crate::cache::traits::CacheStore;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct NoOpCacheStore;

impl NoOpCacheStore {
    pub fn new() -> Self {
        Self
    }
}

impl CacheStore for NoOpCacheStore {
    fn try_get(&self, _key: &str) -> Option<Value> {
        None
    }

    fn set(&self, _key: &str, _value: Value, _ttl: Duration) {}

    fn invalidate(&self, _key: &str) {}

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}
