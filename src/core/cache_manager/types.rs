//! Cache manager type definitions

use crate::core::types::CompletionResponse;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Stored response with its expiry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached response, `from_cache` still false
    pub response: CompletionResponse,
    /// When the entry was created
    pub created_at: Instant,
    /// When the entry expires
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn new(response: CompletionResponse, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            response,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Check if the entry is expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.created_at)
    }
}

/// Atomic cache statistics for lock-free hot path updates
#[derive(Debug, Default)]
pub(crate) struct AtomicCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    /// Callers that joined an in-flight computation
    pub deduplicated: AtomicU64,
    /// Upstream computations started
    pub computations: AtomicU64,
    pub stores: AtomicU64,
    /// Entries removed after expiring
    pub expirations: AtomicU64,
}

impl AtomicCacheStats {
    pub fn snapshot(&self, entries: u64, in_flight: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries,
            in_flight,
        }
    }
}

/// Cache statistics snapshot (returned to callers)
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub deduplicated: u64,
    pub computations: u64,
    pub stores: u64,
    pub expirations: u64,
    /// Approximate number of stored entries
    pub entries: u64,
    pub in_flight: usize,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
