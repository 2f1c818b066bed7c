//! Error types for the retrieval gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Detail returned to callers for every server-side failure.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal Service Error";

/// Who is at fault for an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was malformed or unauthenticated
    Client,
    /// The gateway or its backend failed
    Server,
}

/// Gateway errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document with neither text nor metadata
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Delete request naming zero or several deletion modes
    #[error("Invalid delete request: {0}")]
    InvalidDeleteRequest(String),

    /// Query with empty text or a non-positive top_k
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Malformed request outside the typed validations above
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or wrong bearer token
    #[error("Invalid or missing token")]
    Unauthorized,

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Storage backend error
    #[error("Backend error ({backend}): {message}")]
    Backend { backend: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a backend error
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify the error as client or server fault
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidDocument(_)
            | Error::InvalidDeleteRequest(_)
            | Error::InvalidQuery(_)
            | Error::InvalidRequest(_)
            | Error::Unauthorized
            | Error::FileParse { .. }
            | Error::UnsupportedFileType(_) => ErrorKind::Client,
            Error::Config(_)
            | Error::Embedding(_)
            | Error::Backend { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::Http(_)
            | Error::Internal(_) => ErrorKind::Server,
        }
    }

    /// Whether the caller caused this error
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Client
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            _ if self.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server faults never leak backend internals to the caller
        let detail = match self.kind() {
            ErrorKind::Client => self.to_string(),
            ErrorKind::Server => {
                tracing::error!(error = %self, "request failed");
                INTERNAL_ERROR_DETAIL.to_string()
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
