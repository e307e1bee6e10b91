//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;

use tracing::info;

use crate::error::{CacheError, Result};

/// Environment variable holding the cache capacity.
pub const CAPACITY_ENV_VAR: &str = "LRU_CACHE_CAPACITY";

/// Capacity used when nothing is configured.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
}

impl CacheConfig {
    /// Creates a config with an explicit capacity.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LRU_CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    ///
    /// A variable that is set but is not a positive integer is an error
    /// rather than a silent fallback to the default.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            capacity: parse_capacity(env::var(CAPACITY_ENV_VAR).ok())?,
        };
        info!(capacity = config.capacity, "Cache configuration loaded");
        Ok(config)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

fn parse_capacity(raw: Option<String>) -> Result<usize> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_CAPACITY);
    };

    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(CacheError::InvalidConfig(format!(
            "{}={:?} is not a positive integer",
            CAPACITY_ENV_VAR, raw
        ))),
        Ok(capacity) => Ok(capacity),
    }
}
