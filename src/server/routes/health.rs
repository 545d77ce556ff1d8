//! Health check and metrics endpoints

use crate::core::cache_manager::CacheStats;
use crate::core::circuit_breaker::CircuitBreakerMetrics;
use crate::core::metrics::MetricsSnapshot;
use crate::server::state::AppState;
use crate::{BuildInfo, build_info};
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics));
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    build: BuildInfo,
    providers: usize,
    enabled_providers: usize,
}

/// Liveness probe
pub async fn health_check(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Health check requested");
    let registry = state.completions.registry();
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now(),
        build: build_info(),
        providers: registry.len(),
        enabled_providers: registry.list_enabled().len(),
    }))
}

#[derive(Debug, Serialize)]
struct MetricsResponse {
    #[serde(flatten)]
    gateway: MetricsSnapshot,
    cache: CacheStats,
    circuits: BTreeMap<String, CircuitBreakerMetrics>,
}

/// Per-provider counters, cache statistics and breaker metrics
pub async fn metrics(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let completions = &state.completions;
    Ok(HttpResponse::Ok().json(MetricsResponse {
        gateway: completions.metrics().snapshot(),
        cache: completions.cache().stats().await,
        circuits: completions.breakers().metrics(),
    }))
}
