//! Response cache implementation
//!
//! Storage is a bounded `moka` cache; expiry is checked lazily against the
//! tokio clock on every lookup, with an optional periodic sweep. In-flight
//! computations live in a separate map of shared futures keyed by
//! fingerprint. A computation stores its response before leaving that map,
//! so a caller always finds either the in-flight entry or the stored one.

use super::types::{AtomicCacheStats, CacheEntry, CacheStats};
use crate::config::CacheConfig;
use crate::core::fingerprint::Fingerprint;
use crate::core::types::{CompletionResponse, RequestContext};
use crate::utils::error::{GatewayError, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

type SharedComputation = Shared<BoxFuture<'static, Result<CompletionResponse>>>;

struct CacheInner {
    store: Cache<Fingerprint, CacheEntry>,
    in_flight: DashMap<Fingerprint, SharedComputation>,
    ttl: Duration,
    stats: AtomicCacheStats,
}

/// Fingerprint-keyed response cache with singleflight deduplication
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<CacheInner>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.inner.ttl)
            .field("in_flight", &self.inner.in_flight.len())
            .finish()
    }
}

impl ResponseCache {
    /// Create a new response cache
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_ttl(config.ttl(), config.max_entries)
    }

    pub fn with_ttl(ttl: Duration, max_entries: u64) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                store: Cache::builder().max_capacity(max_entries).build(),
                in_flight: DashMap::new(),
                ttl,
                stats: AtomicCacheStats::default(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Get a cached response, marked `from_cache`.
    ///
    /// Expired entries count as misses and are removed.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        fingerprint: &Fingerprint,
    ) -> Option<CompletionResponse> {
        let stats = &self.inner.stats;
        match self.inner.store.get(fingerprint).await {
            Some(entry) if !entry.is_expired() => {
                stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(request_id = %ctx.request_id, %fingerprint, "Cache hit");
                Some(entry.response.cached_copy())
            }
            Some(entry) => {
                if self.remove_if_expired(fingerprint, entry.expires_at).await {
                    stats.expirations.fetch_add(1, Ordering::Relaxed);
                }
                stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!(request_id = %ctx.request_id, %fingerprint, "Cache entry expired");
                None
            }
            None => {
                stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a response, replacing any previous entry
    pub async fn insert(&self, fingerprint: Fingerprint, response: CompletionResponse) {
        store(&self.inner, fingerprint, response).await;
    }

    /// Return the cached response or run `compute` at most once per fingerprint.
    ///
    /// Callers arriving while a computation for the same fingerprint is in
    /// flight wait for it and get the same outcome. Only successes are
    /// stored. The computation runs on its own task, so it completes and
    /// populates the cache even if every waiting caller goes away.
    pub async fn get_or_compute<F, Fut>(
        &self,
        ctx: &RequestContext,
        fingerprint: &Fingerprint,
        compute: F,
    ) -> Result<CompletionResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CompletionResponse>> + Send + 'static,
    {
        if let Some(hit) = self.get(ctx, fingerprint).await {
            return Ok(hit);
        }

        let (computation, leader) = match self.inner.in_flight.entry(fingerprint.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let computation = self
                    .computation(ctx, fingerprint.clone(), compute())
                    .boxed()
                    .shared();
                entry.insert(computation.clone());
                (computation, true)
            }
        };

        if leader {
            self.inner.stats.computations.fetch_add(1, Ordering::Relaxed);
            debug!(request_id = %ctx.request_id, %fingerprint, "Starting upstream computation");
            tokio::spawn(computation.clone());
        } else {
            self.inner.stats.deduplicated.fetch_add(1, Ordering::Relaxed);
            debug!(request_id = %ctx.request_id, %fingerprint, "Joining in-flight computation");
        }

        computation.await
    }

    fn computation<Fut>(
        &self,
        ctx: &RequestContext,
        fingerprint: Fingerprint,
        work: Fut,
    ) -> impl Future<Output = Result<CompletionResponse>> + Send + 'static
    where
        Fut: Future<Output = Result<CompletionResponse>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let request_id = ctx.request_id.clone();
        async move {
            // A computation that finished after our lookup already stored this key
            if let Some(entry) = inner.store.get(&fingerprint).await {
                if !entry.is_expired() {
                    inner.in_flight.remove(&fingerprint);
                    inner.stats.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(entry.response.cached_copy());
                }
            }

            // A panic must not poison the shared future or strand the key
            let result = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!(%request_id, %fingerprint, "Computation panicked");
                    Err(GatewayError::internal("completion computation panicked"))
                }
            };
            match &result {
                Ok(response) => store(&inner, fingerprint.clone(), response.clone()).await,
                Err(e) => debug!(%request_id, %fingerprint, error = %e, "Computation failed, nothing cached"),
            }
            inner.in_flight.remove(&fingerprint);
            result
        }
    }

    /// Remove the entry for `fingerprint` only if it is still the one that
    /// expires at `expires_at`; a fresher entry stored meanwhile is kept.
    pub(crate) async fn remove_if_expired(
        &self,
        fingerprint: &Fingerprint,
        expires_at: Instant,
    ) -> bool {
        let outcome = self
            .inner
            .store
            .entry_by_ref(fingerprint)
            .and_compute_with(|current| {
                let op = match current {
                    Some(current) if current.value().expires_at == expires_at => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
        matches!(outcome, CompResult::Removed(_))
    }

    /// Remove one entry
    pub async fn invalidate(&self, fingerprint: &Fingerprint) {
        self.inner.store.invalidate(fingerprint).await;
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.inner.store.invalidate_all();
        info!("Response cache cleared");
    }

    /// Remove every expired entry, returning how many were dropped
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<(Fingerprint, Instant)> = self
            .inner
            .store
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, entry)| (key.as_ref().clone(), entry.expires_at))
            .collect();

        let mut removed = 0;
        for (key, expires_at) in &expired {
            if self.remove_if_expired(key, *expires_at).await {
                removed += 1;
            }
        }
        self.inner
            .stats
            .expirations
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Run [`sweep`](Self::sweep) every `interval` until the handle is aborted
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.sweep().await;
                if removed > 0 {
                    debug!("Swept {} expired cache entries", removed);
                }
            }
        })
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.inner.store.run_pending_tasks().await;
        self.inner
            .stats
            .snapshot(self.inner.store.entry_count(), self.inner.in_flight.len())
    }

    /// Number of computations currently in flight
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }
}

async fn store(inner: &CacheInner, fingerprint: Fingerprint, response: CompletionResponse) {
    debug!(%fingerprint, ttl_secs = inner.ttl.as_secs(), "Caching response");
    inner
        .store
        .insert(fingerprint, CacheEntry::new(response, inner.ttl))
        .await;
    inner.stats.stores.fetch_add(1, Ordering::Relaxed);
}
