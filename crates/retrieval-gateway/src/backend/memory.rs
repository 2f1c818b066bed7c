//! In-memory backend using cosine similarity

use async_trait::async_trait;
use futures::future::try_join_all;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::Backend;
use crate::error::{Error, Result};
use crate::ingestion::TextChunker;
use crate::providers::{cosine_similarity, EmbeddingProvider};
use crate::types::{
    DeleteMode, Document, DocumentChunk, DocumentChunkWithScore, QueryResult, ResolvedQuery,
};

/// Chunks grouped by parent document id
pub type ChunkIndex = HashMap<String, Vec<DocumentChunk>>;

/// A document id with its embedded chunks, ready to be stored
pub type PreparedDocument = (String, Vec<DocumentChunk>);

/// Store prepared documents, replacing earlier chunks of the same ids
pub fn apply_upsert(index: &mut ChunkIndex, prepared: Vec<PreparedDocument>) -> Vec<String> {
    let ids = prepared.iter().map(|(id, _)| id.clone()).collect();
    for (document_id, chunks) in prepared {
        tracing::debug!(document_id = %document_id, chunks = chunks.len(), "storing document");
        index.insert(document_id, chunks);
    }
    ids
}

/// Remove whatever the delete mode selects
pub fn apply_delete(index: &mut ChunkIndex, mode: &DeleteMode) {
    match mode {
        DeleteMode::Ids(ids) => {
            for id in ids {
                index.remove(id);
            }
        }
        DeleteMode::Filter(filter) => {
            index.retain(|_, chunks| {
                chunks.retain(|chunk| !filter.matches(&chunk.metadata));
                !chunks.is_empty()
            });
        }
        DeleteMode::All => index.clear(),
    }
}

/// In-memory backend.
///
/// Chunks are grouped by document, so replacing or deleting a document
/// swaps its whole chunk list under one write lock. Embeddings are computed
/// before the lock is taken.
pub struct MemoryBackend {
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: TextChunker,
    index: RwLock<ChunkIndex>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, chunker: TextChunker) -> Self {
        Self::with_index(embedder, chunker, ChunkIndex::new())
    }

    /// Create a backend holding previously stored chunks
    pub fn with_index(
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: TextChunker,
        index: ChunkIndex,
    ) -> Self {
        Self {
            embedder,
            chunker,
            index: RwLock::new(index),
        }
    }

    /// Copy of the current index
    pub fn snapshot(&self) -> ChunkIndex {
        self.index.read().clone()
    }

    /// Number of stored documents
    pub fn document_count(&self) -> usize {
        self.index.read().len()
    }

    /// Swap in a whole index, e.g. one built and persisted off to the side
    pub fn replace_index(&self, index: ChunkIndex) {
        *self.index.write() = index;
    }

    /// Chunk and embed every document without touching the index.
    ///
    /// Stops at the first failing document.
    pub async fn prepare_documents(&self, documents: &[Document]) -> Result<Vec<PreparedDocument>> {
        let mut prepared = Vec::with_capacity(documents.len());
        for document in documents {
            prepared.push(self.prepare(document).await?);
        }
        Ok(prepared)
    }

    /// Chunk and embed one document
    async fn prepare(&self, document: &Document) -> Result<PreparedDocument> {
        let document_id = document
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut chunks = self.chunker.chunk_document(&document_id, document);

        if !chunks.is_empty() {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
                tracing::error!(document_id = %document_id, error = %e, "failed to embed chunks");
                e
            })?;

            if embeddings.len() != chunks.len() {
                return Err(Error::embedding(format!(
                    "{} returned {} embeddings for {} chunks",
                    self.embedder.name(),
                    embeddings.len(),
                    chunks.len()
                )));
            }
            for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }
        }

        Ok((document_id, chunks))
    }

    async fn query_one(&self, query: &ResolvedQuery) -> Result<QueryResult> {
        let embedding = self.embedder.embed(&query.query).await?;

        let mut scored: Vec<DocumentChunkWithScore> = {
            let index = self.index.read();
            index
                .values()
                .flatten()
                .filter(|chunk| {
                    query
                        .filter
                        .as_ref()
                        .map_or(true, |f| f.matches(&chunk.metadata))
                })
                .map(|chunk| {
                    let score = cosine_similarity(&chunk.embedding, &embedding);
                    DocumentChunkWithScore::from_chunk(chunk, score)
                })
                .collect()
        };

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(query.top_k);

        Ok(QueryResult {
            query: query.query.clone(),
            results: scored,
        })
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn upsert(&self, documents: &[Document]) -> Result<Vec<String>> {
        let prepared = self.prepare_documents(documents).await?;
        let ids = apply_upsert(&mut self.index.write(), prepared);
        Ok(ids)
    }

    async fn query(&self, queries: &[ResolvedQuery]) -> Result<Vec<QueryResult>> {
        try_join_all(queries.iter().map(|q| self.query_one(q))).await
    }

    async fn delete(&self, mode: &DeleteMode) -> Result<bool> {
        apply_delete(&mut self.index.write(), mode);
        Ok(true)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.index.read().values().map(Vec::len).sum())
    }

    async fn health_check(&self) -> Result<bool> {
        self.embedder.health_check().await
    }

    fn name(&self) -> &str {
        "memory"
    }
}
