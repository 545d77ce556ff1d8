//! HTTP server core implementation
//!
//! This module provides the HttpServer struct and its core methods.

use crate::config::{Config, ServerConfig};
use crate::server::middleware::RequestIdMiddleware;
use crate::server::routes;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{
    App, HttpServer as ActixHttpServer, error::JsonPayloadError, middleware::DefaultHeaders, web,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with adapters for every configured provider
    pub fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");
        let state = AppState::from_config(config.clone())?;
        Ok(Self::with_state(state))
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config.gateway.server.clone(),
            state,
        }
    }

    /// Register the gateway routes and middleware on an app
    pub fn configure_app(state: web::Data<AppState>, cfg: &mut web::ServiceConfig) {
        let body_limit = state.config.gateway.server.max_body_size;
        cfg.app_data(state)
            .app_data(
                web::JsonConfig::default()
                    .limit(body_limit)
                    .error_handler(|err: JsonPayloadError, _req| {
                        GatewayError::validation(format!("Invalid request body: {}", err)).into()
                    }),
            )
            .configure(routes::configure_routes);
    }

    /// Start the HTTP server and its background tasks; returns once the server stops
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();
        let workers = self.config.worker_count();

        let background = self.spawn_background_tasks();
        let state = web::Data::new(self.state);

        info!("Starting HTTP server on {} with {} workers", bind_addr, workers);

        let server = ActixHttpServer::new(move || {
            App::new()
                .wrap(RequestIdMiddleware)
                .wrap(TracingLogger::default())
                .wrap(DefaultHeaders::new().add(("Server", "llm-gateway")))
                .configure(|cfg| Self::configure_app(state.clone(), cfg))
        })
        .workers(workers)
        .bind(&bind_addr)
        .map_err(|e| GatewayError::server(format!("Failed to bind {}: {}", bind_addr, e)))?
        .run();

        info!("HTTP server listening on {}", bind_addr);

        let result = server
            .await
            .map_err(|e| GatewayError::server(format!("Server error: {}", e)));

        for task in background {
            task.abort();
        }
        info!("HTTP server stopped");
        result
    }

    fn spawn_background_tasks(&self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();
        let gateway = &self.state.config.gateway;

        if gateway.health_check.enabled {
            tasks.push(self.state.health_monitor.spawn());
        } else {
            warn!("Provider health checks are disabled");
        }

        if let Some(interval) = gateway.cache.sweep_interval() {
            tasks.push(self.state.completions.cache().spawn_sweeper(interval));
        }

        tasks
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
