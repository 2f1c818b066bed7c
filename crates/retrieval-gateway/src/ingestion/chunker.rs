//! Deterministic text chunking shared by every backend

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{Document, DocumentChunk, DocumentChunkMetadata};

/// Splits text into word-bounded chunks, preferring sentence boundaries.
///
/// The same text and settings always yield the same chunks, so chunk IDs
/// (`{document_id}_{index}`) are stable across re-upserts.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Words per chunk before looking for a sentence boundary
    chunk_size: usize,
    /// Only cut at a boundary found past this many characters
    min_chunk_size_chars: usize,
    /// Drop chunks whose length does not exceed this
    min_chunk_length_to_embed: usize,
    /// Maximum number of regular chunks per document
    max_num_chunks: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

impl TextChunker {
    /// Create a new chunker with default boundary settings
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            ..Self::default()
        }
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            min_chunk_size_chars: config.min_chunk_size_chars,
            min_chunk_length_to_embed: config.min_chunk_length_to_embed,
            max_num_chunks: config.max_num_chunks,
        }
    }

    /// Split raw text into chunk texts
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut remaining = text;
        let mut num_chunks = 0;

        while !remaining.trim().is_empty() && num_chunks < self.max_num_chunks {
            // Byte offset where word number `chunk_size` starts, or the end of the text
            let end = remaining
                .unicode_word_indices()
                .nth(self.chunk_size)
                .map(|(idx, _)| idx)
                .unwrap_or(remaining.len());
            let mut span = &remaining[..end];

            if let Some(pos) = span.rfind(['.', '?', '!', '\n']) {
                if span[..pos].chars().count() > self.min_chunk_size_chars {
                    span = &span[..pos + 1];
                }
            }

            self.push_cleaned(&mut chunks, span);
            remaining = &remaining[span.len()..];
            num_chunks += 1;
        }

        if !remaining.trim().is_empty() {
            self.push_cleaned(&mut chunks, remaining);
        }

        chunks
    }

    /// Chunk a document that has already been assigned an ID
    pub fn chunk_document(&self, document_id: &str, document: &Document) -> Vec<DocumentChunk> {
        self.chunk_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| DocumentChunk {
                id: DocumentChunk::chunk_id(document_id, index),
                text,
                metadata: DocumentChunkMetadata::for_document(
                    document_id,
                    document.metadata.as_ref(),
                ),
                embedding: Vec::new(),
            })
            .collect()
    }

    fn push_cleaned(&self, chunks: &mut Vec<String>, span: &str) {
        let cleaned = span.replace('\n', " ");
        let cleaned = cleaned.trim();
        if cleaned.chars().count() > self.min_chunk_length_to_embed {
            chunks.push(cleaned.to_string());
        }
    }
}
