//! Health monitor implementation

use crate::config::HealthCheckConfig;
use crate::core::providers::{HealthStatus, ProviderRegistry};
use crate::core::traits::LLMProvider;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Periodically probes providers and records their health
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    registry: Arc<ProviderRegistry>,
    check_interval: Duration,
    check_timeout: Duration,
}

impl HealthMonitor {
    pub fn new(registry: Arc<ProviderRegistry>, config: &HealthCheckConfig) -> Self {
        Self {
            registry,
            check_interval: config.interval(),
            check_timeout: config.timeout(),
        }
    }

    /// Probe every registered provider once, concurrently
    pub async fn check_all(&self) -> Vec<(String, HealthStatus)> {
        let checks = self
            .registry
            .adapters()
            .into_iter()
            .map(|adapter| self.check_one(adapter));
        let results = join_all(checks).await;

        for (name, status) in &results {
            if let Err(e) = self.registry.update_health(name, *status) {
                warn!("Failed to record health for provider {}: {}", name, e);
            }
        }
        results
    }

    async fn check_one(&self, adapter: Arc<dyn LLMProvider>) -> (String, HealthStatus) {
        let name = adapter.name().to_string();
        let status = match tokio::time::timeout(self.check_timeout, adapter.check_health()).await
        {
            Ok(status) => status,
            Err(_) => {
                debug!("Health check timed out for provider: {}", name);
                HealthStatus::Down
            }
        };
        if status == HealthStatus::Down {
            warn!("Provider {} is down", name);
        } else {
            debug!("Provider {} health: {:?}", name, status);
        }
        (name, status)
    }

    /// Run [`check_all`](Self::check_all) every interval until the handle is aborted
    pub fn spawn(&self) -> JoinHandle<()> {
        let monitor = self.clone();
        info!(
            "Starting health monitor, interval {}s",
            monitor.check_interval.as_secs()
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.check_interval);
            loop {
                ticker.tick().await;
                monitor.check_all().await;
            }
        })
    }
}
