//! Turns an uploaded file plus optional metadata JSON into a Document

use std::sync::Arc;
use thiserror::Error;

use super::parser::{FileUpload, TextExtractor};
use crate::error::{Error, Result};
use crate::types::{Document, DocumentMetadata};

/// Metadata form field that could not be decoded.
///
/// Recovered locally by substituting file defaults; never returned to callers.
#[derive(Debug, Error)]
#[error("malformed document metadata: {0}")]
pub struct MetadataParseError(#[from] serde_json::Error);

/// Decode the raw metadata JSON sent alongside a file
pub fn try_parse_metadata(raw: &str) -> std::result::Result<DocumentMetadata, MetadataParseError> {
    Ok(serde_json::from_str(raw)?)
}

/// Metadata for an uploaded file, falling back to `source = file`
pub fn parse_metadata(raw: Option<&str>) -> DocumentMetadata {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return DocumentMetadata::file_default();
    };

    match try_parse_metadata(raw) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!(error = %e, "using default file metadata");
            DocumentMetadata::file_default()
        }
    }
}

/// Build a validated Document (without an id) from an uploaded file
pub async fn normalize_file(
    upload: FileUpload,
    raw_metadata: Option<&str>,
    extractor: Arc<dyn TextExtractor>,
) -> Result<Document> {
    let metadata = parse_metadata(raw_metadata);
    let filename = upload.filename.clone();

    let text = tokio::task::spawn_blocking(move || extractor.extract(&upload))
        .await
        .map_err(|e| Error::internal(format!("extraction task failed: {}", e)))??;

    tracing::info!(filename = %filename, chars = text.len(), "extracted file text");

    let document = Document::new(text).with_metadata(metadata);
    document.validate()?;
    Ok(document)
}
