//! Provider Registry
//!
//! Holds every configured provider with its descriptor and picks the one that
//! serves a request.

use super::descriptor::{HealthStatus, ModelSpec, ProviderDescriptor};
use crate::core::circuit_breaker::CircuitBreakerRegistry;
use crate::core::traits::LLMProvider;
use crate::core::types::{CompletionRequest, RequestContext};
use crate::utils::error::{GatewayError, Result};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct RegisteredProvider {
    descriptor: ProviderDescriptor,
    adapter: Arc<dyn LLMProvider>,
}

/// Provider chosen for one request
#[derive(Debug, Clone)]
pub struct ProviderSelection {
    pub descriptor: ProviderDescriptor,
    pub provider: Arc<dyn LLMProvider>,
    /// Resolved model, never the `"default"` alias
    pub model: ModelSpec,
}

impl ProviderSelection {
    pub fn provider_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn model_name(&self) -> &str {
        &self.model.name
    }
}

/// Registry of upstream providers keyed by name
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, RegisteredProvider>>,
}

impl ProviderRegistry {
    /// Create new provider registry
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a provider.
    ///
    /// The descriptor's enabled flag is cleared when the adapter reports
    /// itself unusable (for example a missing API key).
    pub fn register(
        &self,
        mut descriptor: ProviderDescriptor,
        adapter: Arc<dyn LLMProvider>,
    ) -> Result<()> {
        if descriptor.name != adapter.name() {
            return Err(GatewayError::config(format!(
                "Descriptor '{}' does not match adapter '{}'",
                descriptor.name,
                adapter.name()
            )));
        }
        if !descriptor.supports_model(&descriptor.default_model) {
            return Err(GatewayError::config(format!(
                "Default model '{}' of provider '{}' is not in its model list",
                descriptor.default_model, descriptor.name
            )));
        }
        if descriptor.enabled && !adapter.is_enabled() {
            warn!("Provider '{}' is configured but cannot serve calls, disabling", descriptor.name);
            descriptor.enabled = false;
        }

        let mut providers = self.providers.write();
        if providers.contains_key(&descriptor.name) {
            return Err(GatewayError::config(format!(
                "Provider '{}' is already registered",
                descriptor.name
            )));
        }
        info!(
            "Registered provider '{}' (priority {}, {} models, enabled: {})",
            descriptor.name,
            descriptor.priority,
            descriptor.models.len(),
            descriptor.enabled
        );
        providers.insert(
            descriptor.name.clone(),
            RegisteredProvider {
                descriptor,
                adapter,
            },
        );
        Ok(())
    }

    /// Get provider descriptor by name
    pub fn get(&self, name: &str) -> Result<ProviderDescriptor> {
        self.providers
            .read()
            .get(name)
            .map(|p| p.descriptor.clone())
            .ok_or_else(|| GatewayError::ProviderNotFound(name.to_string()))
    }

    /// Get the adapter registered under `name`
    pub fn adapter(&self, name: &str) -> Result<Arc<dyn LLMProvider>> {
        self.providers
            .read()
            .get(name)
            .map(|p| Arc::clone(&p.adapter))
            .ok_or_else(|| GatewayError::ProviderNotFound(name.to_string()))
    }

    /// Enabled providers, ascending priority then name
    pub fn list_enabled(&self) -> Vec<ProviderDescriptor> {
        let mut enabled: Vec<_> = self
            .providers
            .read()
            .values()
            .filter(|p| p.descriptor.enabled)
            .map(|p| p.descriptor.clone())
            .collect();
        sort_by_priority(&mut enabled);
        enabled
    }

    /// Every registered provider, same order as [`list_enabled`](Self::list_enabled)
    pub fn list_all(&self) -> Vec<ProviderDescriptor> {
        let mut all: Vec<_> = self
            .providers
            .read()
            .values()
            .map(|p| p.descriptor.clone())
            .collect();
        sort_by_priority(&mut all);
        all
    }

    /// Every registered adapter
    pub fn adapters(&self) -> Vec<Arc<dyn LLMProvider>> {
        self.providers
            .read()
            .values()
            .map(|p| Arc::clone(&p.adapter))
            .collect()
    }

    /// Record a health check result
    pub fn update_health(&self, name: &str, status: HealthStatus) -> Result<()> {
        let mut providers = self.providers.write();
        let entry = providers
            .get_mut(name)
            .ok_or_else(|| GatewayError::ProviderNotFound(name.to_string()))?;
        if entry.descriptor.health != status {
            info!(
                "Provider '{}' health changed: {:?} -> {:?}",
                name, entry.descriptor.health, status
            );
        }
        entry.descriptor.health = status;
        entry.descriptor.last_checked = Some(Utc::now());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    /// Pick the provider and model that serve `request`.
    ///
    /// An explicitly named provider is returned even when its breaker is
    /// open; the breaker then rejects the call itself. Automatic selection
    /// skips providers whose breaker currently rejects calls.
    pub fn select(
        &self,
        ctx: &RequestContext,
        request: &CompletionRequest,
        breakers: &CircuitBreakerRegistry,
    ) -> Result<ProviderSelection> {
        let requested_model = request.requested_model();

        if let Some(name) = request.requested_provider() {
            let providers = self.providers.read();
            let entry = providers
                .get(name)
                .ok_or_else(|| GatewayError::ProviderNotFound(name.to_string()))?;
            if !entry.descriptor.enabled {
                return Err(GatewayError::ProviderUnavailable(format!(
                    "provider '{}' is disabled",
                    name
                )));
            }
            let model_name = requested_model.unwrap_or(&entry.descriptor.default_model);
            let model = entry.descriptor.model(model_name).cloned().ok_or_else(|| {
                GatewayError::ProviderUnavailable(format!(
                    "provider '{}' does not support model '{}'",
                    name, model_name
                ))
            })?;
            debug!(
                request_id = %ctx.request_id,
                provider = name,
                model = %model.name,
                "Selected explicitly requested provider"
            );
            return Ok(ProviderSelection {
                descriptor: entry.descriptor.clone(),
                provider: Arc::clone(&entry.adapter),
                model,
            });
        }

        let providers = self.providers.read();
        let mut candidates: Vec<&RegisteredProvider> =
            providers.values().filter(|p| p.descriptor.enabled).collect();
        candidates.sort_by(|a, b| {
            a.descriptor
                .priority
                .cmp(&b.descriptor.priority)
                .then_with(|| a.descriptor.name.cmp(&b.descriptor.name))
        });

        for candidate in candidates {
            let descriptor = &candidate.descriptor;
            if breakers.is_open(&descriptor.name) {
                debug!(
                    request_id = %ctx.request_id,
                    provider = %descriptor.name,
                    "Skipping provider with open circuit"
                );
                continue;
            }
            let model_name = requested_model.unwrap_or(&descriptor.default_model);
            if let Some(model) = descriptor.model(model_name) {
                debug!(
                    request_id = %ctx.request_id,
                    provider = %descriptor.name,
                    model = %model.name,
                    "Selected provider"
                );
                return Ok(ProviderSelection {
                    descriptor: descriptor.clone(),
                    provider: Arc::clone(&candidate.adapter),
                    model: model.clone(),
                });
            }
        }

        Err(GatewayError::NoProvidersAvailable(match requested_model {
            Some(model) => format!("no available provider supports model '{}'", model),
            None => "every provider is disabled or has an open circuit".to_string(),
        }))
    }
}

fn sort_by_priority(descriptors: &mut [ProviderDescriptor]) {
    descriptors.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers = self.providers.read();
        f.debug_struct("ProviderRegistry")
            .field("provider_count", &providers.len())
            .field("providers", &providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
