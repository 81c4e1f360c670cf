//! Cache configuration.

use super::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// Zone cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of RRsets held. Zero disables caching.
    pub capacity: usize,

    /// Minimum TTL for cached records (seconds).
    pub min_ttl: u32,

    /// Maximum TTL for cached records (seconds).
    pub max_ttl: u32,

    /// Maximum TTL for negative entries (seconds).
    pub negative_ttl_cap: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            min_ttl: 0,
            max_ttl: 86400 * 7, // 7 days
            negative_ttl_cap: 10_800,
        }
    }
}

impl CacheConfig {
    /// Validates cache settings.
    pub fn validate(&self) -> Result<()> {
        if self.min_ttl > self.max_ttl {
            return Err(ConfigError::invalid(
                "cache.min_ttl",
                "min_ttl cannot be greater than max_ttl",
            ));
        }
        Ok(())
    }
}
