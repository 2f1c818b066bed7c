//! Backend-agnostic storage contract and startup selection
//!
//! A backend turns documents into searchable chunks, answers batches of
//! similarity queries and deletes by id, filter or wholesale. Exactly one
//! backend is built at startup from config and shared for the life of the
//! process.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::ingestion::TextChunker;
use crate::providers::create_embedder;
use crate::types::{DeleteMode, Document, QueryResult, ResolvedQuery};

pub use local::LocalBackend;
pub use memory::MemoryBackend;

/// Storage contract every backend implements
#[async_trait]
pub trait Backend: Send + Sync {
    /// Store documents, replacing any existing document with the same id.
    ///
    /// Returns the stored ids in input order. Documents without an id are
    /// assigned one. A failure stops the batch and is returned as one error.
    async fn upsert(&self, documents: &[Document]) -> Result<Vec<String>>;

    /// Answer each query independently; one result per query, in input order
    async fn query(&self, queries: &[ResolvedQuery]) -> Result<Vec<QueryResult>>;

    /// Delete by exactly one mode
    async fn delete(&self, mode: &DeleteMode) -> Result<bool>;

    /// Number of stored chunks
    async fn len(&self) -> Result<usize>;

    /// Check if the backend is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Check if the backend can serve requests
    async fn health_check(&self) -> Result<bool>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Registered backend names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process index, lost on restart
    Memory,
    /// In-process index persisted to a JSON snapshot
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Local => "local",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "local" => Ok(BackendKind::Local),
            other => Err(Error::Config(format!(
                "Unknown datastore '{}' (expected one of: memory, local)",
                other
            ))),
        }
    }
}

/// Build the backend named by `datastore.backend`
pub async fn create_backend(config: &GatewayConfig) -> Result<Arc<dyn Backend>> {
    let kind: BackendKind = config.datastore.backend.parse()?;
    let embedder = create_embedder(&config.embeddings)?;
    let chunker = TextChunker::from_config(&config.chunking);

    let backend: Arc<dyn Backend> = match kind {
        BackendKind::Memory => Arc::new(MemoryBackend::new(embedder, chunker)),
        BackendKind::Local => Arc::new(
            LocalBackend::open(&config.datastore.storage_path, embedder, chunker).await?,
        ),
    };

    tracing::info!(backend = backend.name(), "datastore initialized");
    Ok(backend)
}
