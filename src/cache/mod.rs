//! Cache Module
//!
//! Provides a thread-safe, fixed-capacity cache with LRU eviction.

mod lru;
mod stats;
mod store;


// Re-export public types
pub(crate) use lru::{LruTracker, SlotId};
pub use stats::CacheStats;
pub use store::LruCache;
