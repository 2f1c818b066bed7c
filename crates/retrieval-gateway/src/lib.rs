//! retrieval-gateway: document retrieval behind a pluggable storage backend
//!
//! Documents (raw text or uploaded files) are chunked, embedded and stored by
//! a backend chosen once at startup. Batches of similarity queries with
//! optional metadata filters are answered through the same backend. The
//! [`gateway::Gateway`] validates every request before the backend sees it;
//! [`server`] exposes it over HTTP behind a bearer token.

pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod types;

pub use backend::{create_backend, Backend, BackendKind};
pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use server::GatewayServer;
pub use types::{
    DeleteRequest, Document, DocumentChunk, DocumentMetadata, DocumentMetadataFilter, Query,
    QueryResult, Source,
};
