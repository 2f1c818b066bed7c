//! Query endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /query and /sub/query - run a batch of similarity queries
pub async fn query(
    State(state): State<AppState>,
    request: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(request) = request.map_err(|e| Error::InvalidRequest(e.body_text()))?;
    let start = Instant::now();
    let count = request.queries.len();

    let results = state.gateway().run_queries(request.queries).await?;

    tracing::info!(
        queries = count,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "query batch answered"
    );
    Ok(Json(QueryResponse { results }))
}
