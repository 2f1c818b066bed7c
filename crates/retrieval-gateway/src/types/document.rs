//! Document and chunk types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where a document came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Email message
    Email,
    /// Uploaded file
    File,
    /// Chat transcript
    Chat,
}

/// Structured attributes attached to a document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Creation timestamp, RFC 3339 or `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl DocumentMetadata {
    /// Metadata used for uploaded files when none (or garbage) was supplied
    pub fn file_default() -> Self {
        Self {
            source: Some(Source::File),
            ..Default::default()
        }
    }

    /// True when no attribute is set
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.source_id.is_none()
            && self.url.is_none()
            && self.created_at.is_none()
            && self.author.is_none()
    }
}

/// A user-supplied unit of text with metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Document ID; assigned by the backend when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Full text content
    #[serde(default)]
    pub text: String,
    /// Optional metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
}

impl Document {
    /// Create a document without an ID
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            metadata: None,
        }
    }

    /// Set the document ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the document metadata
    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Reject documents that carry neither text nor metadata
    pub fn validate(&self) -> Result<()> {
        let has_text = !self.text.trim().is_empty();
        let has_metadata = self.metadata.as_ref().is_some_and(|m| !m.is_empty());

        if !has_text && !has_metadata {
            return Err(Error::InvalidDocument(format!(
                "document '{}' has neither text nor metadata",
                self.id.as_deref().unwrap_or("<unassigned>")
            )));
        }
        Ok(())
    }
}

/// Chunk metadata: the parent's metadata plus a back-reference to it
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunkMetadata {
    #[serde(flatten)]
    pub document: DocumentMetadata,
    pub document_id: String,
}

impl DocumentChunkMetadata {
    /// Build chunk metadata for a document
    pub fn for_document(document_id: &str, metadata: Option<&DocumentMetadata>) -> Self {
        Self {
            document: metadata.cloned().unwrap_or_default(),
            document_id: document_id.to_string(),
        }
    }
}

/// A sub-span of a document's text, the unit that gets indexed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    /// `{document_id}_{chunk_index}`
    pub id: String,
    pub text: String,
    pub metadata: DocumentChunkMetadata,
    /// Embedding vector, internal to backends
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl DocumentChunk {
    /// Deterministic chunk ID for a document and chunk position
    pub fn chunk_id(document_id: &str, chunk_index: usize) -> String {
        format!("{document_id}_{chunk_index}")
    }

    /// Parent document ID
    pub fn document_id(&self) -> &str {
        &self.metadata.document_id
    }
}

/// A retrieved chunk with its similarity score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunkWithScore {
    pub id: String,
    pub text: String,
    pub metadata: DocumentChunkMetadata,
    /// Higher is more relevant
    pub score: f32,
}

impl DocumentChunkWithScore {
    /// Pair a chunk with a score, dropping its embedding
    pub fn from_chunk(chunk: &DocumentChunk, score: f32) -> Self {
        Self {
            id: chunk.id.clone(),
            text: chunk.text.clone(),
            metadata: chunk.metadata.clone(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_rejected() {
        let err = Document::new("").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));

        let err = Document::new("   ")
            .with_metadata(DocumentMetadata::default())
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn test_metadata_only_document_is_valid() {
        let doc = Document::new("").with_metadata(DocumentMetadata {
            author: Some("ada".to_string()),
            ..Default::default()
        });
        assert!(doc.validate().is_ok());
        assert!(Document::new("hello").validate().is_ok());
    }

    #[test]
    fn test_chunk_metadata_flattens_parent_fields() {
        let meta = DocumentChunkMetadata::for_document("doc1", Some(&DocumentMetadata::file_default()));
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["source"], "file");
        assert_eq!(value["document_id"], "doc1");
        assert_eq!(DocumentChunk::chunk_id("doc1", 3), "doc1_3");
    }
}
