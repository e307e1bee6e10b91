//! Integration Tests for the LRU cache
//!
//! Exercises the public API end to end, including shared use from many
//! threads and from tokio tasks.

use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

use locked_lru::{CacheConfig, CacheError, LruCache};
use tracing_subscriber::EnvFilter;

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "locked_lru=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Values encode their key so a torn write would be detectable.
fn value_for(key: u32, version: u32) -> (u32, u32) {
    (key, version)
}

// == Walkthrough ==

#[test]
fn test_capacity_two_walkthrough() {
    init_tracing();
    let cache = LruCache::new(2).unwrap();

    cache.put("a", 1);
    assert_eq!(cache.size(), 1);

    cache.put("b", 2);
    assert_eq!(cache.size(), 2);
    assert_eq!(cache.keys(), vec!["a", "b"]);

    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.keys(), vec!["b", "a"]);

    cache.put("c", 3);
    assert_eq!(cache.size(), 2);
    assert!(cache.contains("a"));
    assert!(cache.contains("c"));

    assert_eq!(cache.get("b"), None);

    cache.evict("a");
    assert_eq!(cache.size(), 1);
    assert_eq!(cache.keys(), vec!["c"]);

    cache.clear();
    assert_eq!(cache.size(), 0);
    assert_eq!(cache.to_string(), "{}");
}

#[test]
fn test_construct_from_config() {
    let cache: LruCache<String, u64> = LruCache::from_config(&CacheConfig::default()).unwrap();
    assert_eq!(cache.capacity(), 1000);

    let err = LruCache::<String, u64>::new(0).unwrap_err();
    assert_eq!(err, CacheError::InvalidCapacity(0));
}

#[test]
fn test_stats_serialize_to_json() {
    let cache = LruCache::new(1).unwrap();
    cache.put(1u8, "one");
    cache.put(2u8, "two");
    cache.get(&2u8);
    cache.get(&1u8);

    let json = serde_json::to_value(cache.stats()).unwrap();
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["evictions"], 1);
    assert_eq!(json["entries"], 1);
}

// == Concurrency Tests ==

#[test]
fn test_concurrent_mixed_operations() {
    init_tracing();
    const CAPACITY: usize = 16;
    const THREADS: u32 = 8;
    const OPS_PER_THREAD: u32 = 2_000;

    let cache = Arc::new(LruCache::new(CAPACITY).unwrap());
    let barrier = Arc::new(Barrier::new(THREADS as usize));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..OPS_PER_THREAD {
                    // Overlapping key space shared by every thread
                    let key = (i * 7 + t) % 48;
                    match i % 4 {
                        0 | 1 => cache.put(key, value_for(key, t)),
                        2 => {
                            if let Some((stored_key, _)) = cache.get(&key) {
                                assert_eq!(stored_key, key, "value stored under the wrong key");
                            }
                        }
                        _ => cache.evict(&key),
                    }
                    assert!(cache.size() <= CAPACITY);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let keys = cache.keys();
    assert!(keys.len() <= CAPACITY);
    assert_eq!(keys.len(), cache.size());

    let mut seen = HashMap::new();
    for key in keys {
        assert!(seen.insert(key, ()).is_none(), "key {} tracked twice", key);
        let (stored_key, _) = cache.get(&key).unwrap();
        assert_eq!(stored_key, key);
    }
}

#[test]
fn test_concurrent_fill_keeps_capacity_entries() {
    const CAPACITY: usize = 32;
    let cache = Arc::new(LruCache::new(CAPACITY).unwrap());

    let handles: Vec<_> = (0..4u32)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..500u32 {
                    cache.put(t * 1_000 + i, i);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = cache.stats();
    assert_eq!(cache.size(), CAPACITY);
    assert_eq!(stats.inserts, 2_000);
    assert_eq!(stats.evictions, 2_000 - CAPACITY as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_across_tokio_tasks() {
    init_tracing();
    const CAPACITY: usize = 10;
    let cache: Arc<LruCache<String, usize>> = Arc::new(LruCache::new(CAPACITY).unwrap());

    let mut tasks = Vec::new();
    for t in 0..8usize {
        let cache = Arc::clone(&cache);
        tasks.push(tokio::spawn(async move {
            for i in 0..200usize {
                let key = format!("task-{}", (t + i) % 20);
                cache.put(key.clone(), i);
                cache.get(key.as_str());
                tokio::task::yield_now().await;
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(cache.size(), CAPACITY);
    let stats = cache.stats();
    assert_eq!(stats.inserts + stats.updates, 1_600);
    assert_eq!(stats.entries, CAPACITY);
}
