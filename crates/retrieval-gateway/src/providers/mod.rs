//! Embedding providers used by the storage backends

pub mod embedding;
pub mod hash;
pub mod ollama;

use std::sync::Arc;

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::error::Result;

pub use embedding::{cosine_similarity, EmbeddingProvider};
pub use hash::HashEmbedder;
pub use ollama::OllamaEmbedder;

/// Build the embedding provider named in config
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.provider {
        EmbeddingProviderKind::Hash => Arc::new(HashEmbedder::new(config.dimensions)),
        EmbeddingProviderKind::Ollama => Arc::new(OllamaEmbedder::new(config)?),
    };

    tracing::info!(
        provider = embedder.name(),
        dimensions = embedder.dimensions(),
        "embedding provider ready"
    );
    Ok(embedder)
}
