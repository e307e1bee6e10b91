//! Locked LRU - A thread-safe, fixed-capacity least-recently-used cache
//!
//! Every operation runs under a single mutex. When a new key arrives at
//! full capacity, the entry that has gone longest without a `get` or `put`
//! is evicted.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, LruCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
