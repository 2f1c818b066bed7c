//! In-memory backend persisted to a JSON snapshot file

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::memory::{apply_delete, apply_upsert, ChunkIndex, MemoryBackend};
use super::Backend;
use crate::error::{Error, Result};
use crate::ingestion::TextChunker;
use crate::providers::EmbeddingProvider;
use crate::types::{DeleteMode, Document, QueryResult, ResolvedQuery};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    updated_at: chrono::DateTime<chrono::Utc>,
    documents: ChunkIndex,
}

/// Memory backend that rewrites its snapshot after every mutation.
///
/// Each mutation is applied to a copy of the index, written to a temporary
/// file and renamed into place; only then does the copy replace the live
/// index. A failed write leaves both the file and the live index unchanged.
/// Writes are serialised so a later snapshot never gets overwritten by an
/// earlier one.
pub struct LocalBackend {
    inner: MemoryBackend,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalBackend {
    /// Open the snapshot at `path`, starting empty if the file does not exist.
    ///
    /// A snapshot that exists but cannot be read, or whose embeddings do not
    /// match the embedder's dimensions, is an error.
    pub async fn open(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: TextChunker,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let index = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    Error::backend(
                        "local",
                        format!("Corrupt snapshot {}: {}", path.display(), e),
                    )
                })?;
                if snapshot.version != SNAPSHOT_VERSION {
                    return Err(Error::backend(
                        "local",
                        format!("Unsupported snapshot version {}", snapshot.version),
                    ));
                }
                check_dimensions(&snapshot.documents, embedder.dimensions())?;
                snapshot.documents
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ChunkIndex::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            documents = index.len(),
            "opened local datastore"
        );

        Ok(Self {
            inner: MemoryBackend::with_index(embedder, chunker, index),
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Snapshot file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the index, persist it, then make it live
    async fn commit<T>(&self, change: impl FnOnce(&mut ChunkIndex) -> T) -> Result<T> {
        let _guard = self.write_lock.lock().await;

        let mut documents = self.inner.snapshot();
        let output = change(&mut documents);

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            updated_at: chrono::Utc::now(),
            documents,
        };
        self.write_snapshot(&snapshot).await.map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "snapshot write failed");
            e
        })?;

        self.inner.replace_index(snapshot.documents);
        Ok(output)
    }

    async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec(snapshot)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }
}

/// Stored embeddings must have the length the current embedder produces
fn check_dimensions(index: &ChunkIndex, dimensions: usize) -> Result<()> {
    let stored = index
        .values()
        .flatten()
        .map(|chunk| chunk.embedding.len())
        .find(|len| *len > 0);

    match stored {
        Some(len) if len != dimensions => Err(Error::backend(
            "local",
            format!(
                "Snapshot embeddings have {} dimensions but the embedder produces {}",
                len, dimensions
            ),
        )),
        _ => Ok(()),
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn upsert(&self, documents: &[Document]) -> Result<Vec<String>> {
        let prepared = self.inner.prepare_documents(documents).await?;
        self.commit(|index| apply_upsert(index, prepared)).await
    }

    async fn query(&self, queries: &[ResolvedQuery]) -> Result<Vec<QueryResult>> {
        self.inner.query(queries).await
    }

    async fn delete(&self, mode: &DeleteMode) -> Result<bool> {
        self.commit(|index| apply_delete(index, mode)).await?;
        Ok(true)
    }

    async fn len(&self) -> Result<usize> {
        self.inner.len().await
    }

    async fn health_check(&self) -> Result<bool> {
        self.inner.health_check().await
    }

    fn name(&self) -> &str {
        "local"
    }
}
