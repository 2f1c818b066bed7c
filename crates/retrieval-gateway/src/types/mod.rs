//! Core types for the retrieval gateway

pub mod api;
pub mod delete;
pub mod document;
pub mod filter;
pub mod query;

pub use api::{DeleteResponse, QueryRequest, QueryResponse, UpsertRequest, UpsertResponse};
pub use delete::{DeleteMode, DeleteRequest};
pub use document::{
    Document, DocumentChunk, DocumentChunkMetadata, DocumentChunkWithScore, DocumentMetadata,
    Source,
};
pub use filter::DocumentMetadataFilter;
pub use query::{Query, QueryResult, ResolvedQuery, DEFAULT_TOP_K};
