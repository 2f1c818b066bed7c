//! Application state for the gateway server

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::gateway::Gateway;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: GatewayConfig,
    /// Orchestrator owning the backend
    gateway: Gateway,
}

impl AppState {
    /// Create new application state
    pub fn new(config: GatewayConfig, gateway: Gateway) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, gateway }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Get the gateway
    pub fn gateway(&self) -> &Gateway {
        &self.inner.gateway
    }

    /// Token every operation route requires
    pub fn bearer_token(&self) -> Option<&str> {
        self.inner.config.auth.token()
    }
}
