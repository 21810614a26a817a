//! Cache store trait definition

use serde_json::Value;
use std::time::Duration;

/// Contract for the external cache store.
///
/// Implementations must be safe to share between concurrent callers.
pub trait CacheStore: Send + Sync {
    /// Returns `Some(value)` on hit, `None` on miss or expiry.
    fn try_get(&self, key: &str) -> Option<Value>;

    /// Store a value that expires after `ttl`.
    fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Drop a single key.
    fn invalidate(&self, key: &str);

    /// Name of the store, for diagnostics.
    fn provider_name(&self) -> &'static str;
}
