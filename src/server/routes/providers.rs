//! Provider introspection and breaker control endpoints

use crate::core::circuit_breaker::CircuitState;
use crate::core::providers::ProviderDescriptor;
use crate::server::state::AppState;
use crate::utils::error::GatewayError;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Serialize;
use tracing::info;

/// Configure provider routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/providers")
            .route("", web::get().to(list_providers))
            .route("/{name}", web::get().to(get_provider))
            .route("/{name}/circuit/half-open", web::post().to(half_open_circuit)),
    );
}

/// Descriptor plus live breaker mode
#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    #[serde(flatten)]
    pub descriptor: ProviderDescriptor,
    pub circuit_state: Option<CircuitState>,
}

fn status(state: &AppState, descriptor: ProviderDescriptor) -> ProviderStatus {
    let circuit_state = state.completions.breakers().state(&descriptor.name);
    ProviderStatus {
        descriptor,
        circuit_state,
    }
}

/// Every registered provider, ordered by priority
pub async fn list_providers(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let providers: Vec<ProviderStatus> = state
        .completions
        .registry()
        .list_all()
        .into_iter()
        .map(|descriptor| status(&state, descriptor))
        .collect();
    Ok(HttpResponse::Ok().json(providers))
}

pub async fn get_provider(
    state: web::Data<AppState>,
    name: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let descriptor = state.completions.registry().get(&name)?;
    Ok(HttpResponse::Ok().json(status(&state, descriptor)))
}

#[derive(Debug, Serialize)]
struct TransitionResult {
    provider: String,
    transitioned: bool,
    circuit_state: CircuitState,
}

/// Explicit OPEN → HALF_OPEN trigger
pub async fn half_open_circuit(
    state: web::Data<AppState>,
    name: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let name = name.into_inner();
    let breaker = state
        .completions
        .breakers()
        .get(&name)
        .ok_or_else(|| GatewayError::ProviderNotFound(name.clone()))?;

    let transitioned = breaker.transition_to_half_open();
    if transitioned {
        info!("Circuit for provider {} moved to half-open on request", name);
    }
    Ok(HttpResponse::Ok().json(TransitionResult {
        provider: name,
        transitioned,
        circuit_state: breaker.state(),
    }))
}
