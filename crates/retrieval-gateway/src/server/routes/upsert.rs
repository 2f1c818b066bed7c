//! Document and file upsert endpoints

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::ingestion::FileUpload;
use crate::server::state::AppState;
use crate::types::{UpsertRequest, UpsertResponse};

/// POST /upsert - store a batch of documents
pub async fn upsert(
    State(state): State<AppState>,
    request: std::result::Result<Json<UpsertRequest>, JsonRejection>,
) -> Result<Json<UpsertResponse>> {
    let Json(request) = request.map_err(|e| Error::InvalidRequest(e.body_text()))?;
    let ids = state.gateway().upsert_documents(request.documents).await?;
    Ok(Json(UpsertResponse { ids }))
}

/// POST /upsert-file - multipart `file` plus optional JSON `metadata` field
pub async fn upsert_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UpsertResponse>> {
    let mut upload = None;
    let mut metadata = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    Error::InvalidRequest(format!("Failed to read file: {}", e))
                })?;

                tracing::info!("Processing file: {} ({} bytes)", filename, data.len());
                upload = Some(FileUpload {
                    filename,
                    content_type,
                    data,
                });
            }
            "metadata" => {
                metadata = Some(field.text().await.map_err(|e| {
                    Error::InvalidRequest(format!("Failed to read metadata: {}", e))
                })?);
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    let upload = upload.ok_or_else(|| Error::InvalidRequest("Missing 'file' field".to_string()))?;
    let ids = state.gateway().upsert_file(upload, metadata).await?;
    Ok(Json(UpsertResponse { ids }))
}
