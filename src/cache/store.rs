//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking behind a
//! single mutex.

use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, trace, warn};

use crate::cache::{CacheStats, LruTracker, SlotId};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

struct Slot<V> {
    value: V,
    id: SlotId,
}

/// State guarded by the cache lock. `map` and `order` always hold the same keys.
struct Inner<K, V> {
    map: HashMap<K, Slot<V>>,
    order: LruTracker<K>,
    stats: CacheStats,
}

impl<K: Hash + Eq, V> Inner<K, V> {
    /// Entries from least to most recently used.
    fn ordered(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.order
            .iter()
            .filter_map(move |key| self.map.get(key).map(|slot| (key, &slot.value)))
    }
}

// == LRU Cache ==
/// Thread-safe, fixed-capacity cache with least-recently-used eviction.
///
/// Every operation takes the one internal lock for its whole duration, so
/// operations are linearizable and no caller ever sees a half-applied
/// update. Share an instance between threads by wrapping it in an `Arc`.
///
/// ```
/// use locked_lru::LruCache;
///
/// let cache = LruCache::new(2).unwrap();
/// cache.put("a", 1);
/// cache.put("b", 2);
/// assert_eq!(cache.get("a"), Some(1));
///
/// // "b" is now the least recently used entry
/// cache.put("c", 3);
/// assert!(!cache.contains("b"));
/// ```
pub struct LruCache<K, V> {
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> LruCache<K, V> {
    /// Returns the fixed maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Poisoning can only follow a panic in a caller's Hash or Eq impl. Writes
    // hash before touching either structure, so the state is normally intact;
    // a panic inside a map rehash can still drop map entries, in which case
    // the lengths disagree and the entries are discarded.
    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                let mut guard = poisoned.into_inner();
                if guard.map.len() != guard.order.len() {
                    warn!(
                        map = guard.map.len(),
                        order = guard.order.len(),
                        "Discarding LRU cache entries left inconsistent by a panic"
                    );
                    guard.map.clear();
                    guard.order.clear();
                }
                self.inner.clear_poison();
                guard
            }
        }
    }
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidCapacity` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        debug!(capacity, "LRU cache created");
        Ok(Self {
            capacity,
            inner: Mutex::new(Inner {
                map: HashMap::with_capacity(capacity),
                order: LruTracker::with_capacity(capacity),
                stats: CacheStats::new(),
            }),
        })
    }

    /// Creates an empty cache sized from `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.capacity)
    }

    // == Get ==
    /// Returns a copy of the value for `key` and marks it most recently used.
    ///
    /// Returns None if the key is absent.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let mut guard = self.lock();
        let inner = &mut *guard;

        match inner.map.get(key) {
            Some(slot) => {
                let value = slot.value.clone();
                inner.order.touch(slot.id);
                inner.stats.record_hit();
                Some(value)
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores a key-value pair as the most recently used entry.
    ///
    /// If the key already exists its value is replaced and the size is
    /// unchanged. Otherwise, if the cache is full, the least recently used
    /// entry is evicted first.
    pub fn put(&self, key: K, value: V) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if let Some(slot) = inner.map.get_mut(&key) {
            slot.value = value;
            inner.order.touch(slot.id);
            inner.stats.record_update();
            return;
        }

        // Hash and Eq run before the recency list changes, so a panicking key
        // leaves map and list in step.
        if inner.map.len() >= self.capacity {
            if let Some(oldest) = inner.order.peek_front() {
                inner.map.remove(oldest);
                inner.order.pop_front();
                inner.stats.record_eviction();
                trace!(
                    capacity = self.capacity,
                    size = inner.map.len(),
                    "Evicted least recently used entry"
                );
            }
        }

        let order_key = key.clone();
        if let Entry::Vacant(entry) = inner.map.entry(key) {
            let id = inner.order.push_back(order_key);
            entry.insert(Slot { value, id });
            inner.stats.record_insert();
        }
    }

    // == Evict ==
    /// Removes `key` if present. Absent keys are ignored.
    pub fn evict<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if let Some(slot) = inner.map.remove(key) {
            inner.order.remove(slot.id);
        }
    }

    // == Clear ==
    /// Removes every entry. Capacity and statistics counters are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let removed = inner.map.len();
        inner.map.clear();
        inner.order.clear();
        debug!(removed, "LRU cache cleared");
    }

    // == Size ==
    /// Returns the current number of entries.
    pub fn size(&self) -> usize {
        self.lock().map.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().map.is_empty()
    }

    // == Contains ==
    /// Checks whether `key` is present without changing its recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().map.contains_key(key)
    }

    /// Snapshot of the keys, least recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.lock().order.iter().cloned().collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let mut stats = inner.stats.clone();
        stats.entries = inner.map.len();
        stats
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: fmt::Debug + Hash + Eq,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        let entries: Vec<(&K, &V)> = inner.ordered().collect();
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("size", &inner.map.len())
            .field("entries", &entries)
            .finish()
    }
}

/// Renders the entries least recently used first, e.g. `{a: 1, b: 2}`.
impl<K, V> fmt::Display for LruCache<K, V>
where
    K: fmt::Display + Hash + Eq,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.write_str("{")?;
        for (i, (key, value)) in inner.ordered().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        f.write_str("}")
    }
}
