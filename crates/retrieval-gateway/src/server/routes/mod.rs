//! Operation routes, all behind the bearer token gate

pub mod delete;
pub mod query;
pub mod upsert;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, post},
    Router,
};

use super::auth::require_bearer;
use crate::server::state::AppState;

/// Build all operation routes
pub fn api_routes(state: AppState, max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/upsert", post(upsert::upsert))
        // File upload - with larger body limit
        .route(
            "/upsert-file",
            post(upsert::upsert_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/query", post(query::query))
        // Same handler, mounted for sub-path deployments of the plugin manifest
        .route("/sub/query", post(query::query))
        .route("/delete", delete(delete::delete))
        .route_layer(middleware::from_fn_with_state(state, require_bearer))
}
