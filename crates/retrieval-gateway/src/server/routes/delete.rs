//! Delete endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{DeleteRequest, DeleteResponse};

/// DELETE /delete - remove documents by ids, filter, or everything
pub async fn delete(
    State(state): State<AppState>,
    request: std::result::Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>> {
    let Json(request) = request.map_err(|e| Error::InvalidRequest(e.body_text()))?;
    let success = state.gateway().delete(request).await?;
    Ok(Json(DeleteResponse { success }))
}
