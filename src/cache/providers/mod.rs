//! Cache store implementations

pub mod memory;
pub mod noop;

pub use memory::MemoryCacheStore;
pub use noop::NoOpCacheStore;
