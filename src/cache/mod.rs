//! # Response Cache
//!
//! The cache stage talks to a [`CacheStore`] through three synchronous calls:
//! `try_get`, `set` with a TTL, and `invalidate`. Stores are internally
//! thread-safe and never suspend, so the same stage code serves every call
//! shape.
//!
//! ```text
//! CacheStore (trait)
//!   ├── MemoryCacheStore   <- per-process moka cache, per-entry TTL
//!   └── NoOpCacheStore     <- always miss, always succeed
//! ```
//!
//! Keys come from [`CacheKeyGenerator`]: method identity plus the ordered,
//! rendered argument values.

pub mod key;
pub mod providers;
pub mod traits;

pub use key::CacheKeyGenerator;
pub use providers::{MemoryCacheStore, NoOpCacheStore};
pub use traits::CacheStore;
