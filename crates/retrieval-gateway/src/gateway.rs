//! Upsert, query and delete orchestration in front of a backend

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::ingestion::{normalize_file, FileParser, FileUpload, TextExtractor};
use crate::types::{DeleteRequest, Document, Query, QueryResult};

/// Validates requests and drives the configured backend.
///
/// The backend is chosen once at startup and never replaced.
#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn Backend>,
    extractor: Arc<dyn TextExtractor>,
}

impl Gateway {
    /// Create a gateway using the built-in file parser
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_extractor(backend, Arc::new(FileParser))
    }

    /// Create a gateway with a custom text extractor
    pub fn with_extractor(backend: Arc<dyn Backend>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self { backend, extractor }
    }

    /// The backend behind this gateway
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Store documents; the whole batch is rejected if any document is invalid
    pub async fn upsert_documents(&self, documents: Vec<Document>) -> Result<Vec<String>> {
        for (position, document) in documents.iter().enumerate() {
            document.validate().map_err(|e| match e {
                Error::InvalidDocument(msg) => {
                    Error::InvalidDocument(format!("document {}: {}", position, msg))
                }
                other => other,
            })?;
        }
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let ids = self
            .backend
            .upsert(&documents)
            .await
            .map_err(|e| self.backend_failure("upsert", e))?;

        tracing::info!(backend = self.backend.name(), documents = ids.len(), "upserted documents");
        Ok(ids)
    }

    /// Extract an uploaded file into one document and store it
    pub async fn upsert_file(
        &self,
        upload: FileUpload,
        raw_metadata: Option<String>,
    ) -> Result<Vec<String>> {
        let document =
            normalize_file(upload, raw_metadata.as_deref(), Arc::clone(&self.extractor)).await?;
        self.upsert_documents(vec![document]).await
    }

    /// Answer a batch of queries, one result per query in input order
    pub async fn run_queries(&self, queries: Vec<Query>) -> Result<Vec<QueryResult>> {
        let resolved = queries
            .into_iter()
            .map(Query::resolve)
            .collect::<Result<Vec<_>>>()?;
        if resolved.is_empty() {
            return Ok(Vec::new());
        }

        let results = self
            .backend
            .query(&resolved)
            .await
            .map_err(|e| self.backend_failure("query", e))?;

        if results.len() != resolved.len() {
            let e = Error::backend(
                self.backend.name(),
                format!(
                    "returned {} results for {} queries",
                    results.len(),
                    resolved.len()
                ),
            );
            return Err(self.backend_failure("query", e));
        }

        Ok(resolved
            .into_iter()
            .zip(results)
            .map(|(query, mut result)| {
                result.results.truncate(query.top_k);
                result.query = query.query;
                result
            })
            .collect())
    }

    /// Delete by exactly one of ids, filter or delete_all
    pub async fn delete(&self, request: DeleteRequest) -> Result<bool> {
        let mode = request.validate()?;

        let success = self
            .backend
            .delete(&mode)
            .await
            .map_err(|e| self.backend_failure("delete", e))?;

        tracing::info!(backend = self.backend.name(), ?mode, success, "delete completed");
        Ok(success)
    }

    /// Ready when the backend reports healthy
    pub async fn is_ready(&self) -> bool {
        match self.backend.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "health check failed");
                false
            }
        }
    }

    fn backend_failure(&self, operation: &str, e: Error) -> Error {
        tracing::error!(backend = self.backend.name(), operation, error = %e, "backend call failed");
        match e {
            Error::Backend { .. } => e,
            e if e.is_client_error() => e,
            e => Error::backend(self.backend.name(), e.to_string()),
        }
    }
}
