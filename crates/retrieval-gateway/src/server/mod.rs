//! HTTP server for the retrieval gateway

pub mod auth;
pub mod routes;
pub mod state;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use state::AppState;

/// Gateway HTTP server
pub struct GatewayServer {
    state: AppState,
}

impl GatewayServer {
    /// Create a server around an already-built gateway
    pub fn new(config: GatewayConfig, gateway: Gateway) -> Self {
        Self {
            state: AppState::new(config, gateway),
        }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let config = &self.state.config().server;

        let mut router = Router::new()
            // Health check
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .merge(routes::api_routes(self.state.clone(), config.max_upload_size));

        if let Some(dir) = &config.well_known_dir {
            router = router.nest_service("/.well-known", ServeDir::new(dir));
        }

        let mut router = router
            .with_state(self.state.clone())
            // Middleware layers (order matters - applied bottom to top)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http());

        if config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        tracing::info!("Starting retrieval gateway on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        let server = &self.state.config().server;
        format!("{}:{}", server.host, server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.gateway().is_ready().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
