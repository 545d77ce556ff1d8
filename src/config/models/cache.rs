//! Response cache configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable caching and request deduplication
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl: u64,
    /// Maximum number of stored responses
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: u64,
    /// Interval of the background expiry sweep in seconds; lazy expiry only when unset
    #[serde(default)]
    pub sweep_interval: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: default_cache_ttl(),
            max_entries: default_cache_max_entries(),
            sweep_interval: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
