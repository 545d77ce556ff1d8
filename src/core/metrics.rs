//! Gateway metrics collection and reporting

use crate::core::types::Usage;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free counters of one provider
#[derive(Debug, Default)]
struct ProviderCounters {
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    short_circuits: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    streams: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    total_latency_ms: AtomicU64,
}

/// Metrics for a specific provider
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderMetrics {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    /// Calls rejected by the circuit breaker
    pub short_circuits: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub streams: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Average latency of successful upstream calls
    pub avg_latency_ms: f64,
}

/// Point-in-time view of every provider's counters
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub providers: BTreeMap<String, ProviderMetrics>,
}

impl MetricsSnapshot {
    pub fn total_requests(&self) -> u64 {
        self.providers.values().map(|p| p.requests).sum()
    }
}

/// Gateway metrics collector
#[derive(Debug)]
pub struct GatewayMetrics {
    providers: DashMap<String, Arc<ProviderCounters>>,
    start_time: Instant,
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self {
            providers: DashMap::new(),
            start_time: Instant::now(),
        }
    }

    fn counters(&self, provider: &str) -> Arc<ProviderCounters> {
        if let Some(counters) = self.providers.get(provider) {
            return Arc::clone(counters.value());
        }
        self.providers
            .entry(provider.to_string())
            .or_default()
            .value()
            .clone()
    }

    pub fn record_request(&self, provider: &str) {
        self.counters(provider)
            .requests
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful upstream call
    pub fn record_success(&self, provider: &str, latency: Duration, usage: &Usage) {
        let counters = self.counters(provider);
        counters.successes.fetch_add(1, Ordering::Relaxed);
        counters
            .total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
        counters
            .input_tokens
            .fetch_add(u64::from(usage.input_tokens), Ordering::Relaxed);
        counters
            .output_tokens
            .fetch_add(u64::from(usage.output_tokens), Ordering::Relaxed);
    }

    pub fn record_failure(&self, provider: &str) {
        self.counters(provider)
            .failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_short_circuit(&self, provider: &str) {
        self.counters(provider)
            .short_circuits
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self, provider: &str) {
        self.counters(provider)
            .cache_hits
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self, provider: &str) {
        self.counters(provider)
            .cache_misses
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stream(&self, provider: &str) {
        self.counters(provider)
            .streams
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let providers = self
            .providers
            .iter()
            .map(|entry| {
                let c = entry.value();
                let successes = c.successes.load(Ordering::Relaxed);
                let latency = c.total_latency_ms.load(Ordering::Relaxed);
                let metrics = ProviderMetrics {
                    requests: c.requests.load(Ordering::Relaxed),
                    successes,
                    failures: c.failures.load(Ordering::Relaxed),
                    short_circuits: c.short_circuits.load(Ordering::Relaxed),
                    cache_hits: c.cache_hits.load(Ordering::Relaxed),
                    cache_misses: c.cache_misses.load(Ordering::Relaxed),
                    streams: c.streams.load(Ordering::Relaxed),
                    input_tokens: c.input_tokens.load(Ordering::Relaxed),
                    output_tokens: c.output_tokens.load(Ordering::Relaxed),
                    avg_latency_ms: if successes == 0 {
                        0.0
                    } else {
                        latency as f64 / successes as f64
                    },
                };
                (entry.key().clone(), metrics)
            })
            .collect();

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            providers,
        }
    }
}
