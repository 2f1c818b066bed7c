//! Query request and result types

use serde::{Deserialize, Serialize};

use super::document::DocumentChunkWithScore;
use super::filter::DocumentMetadataFilter;
use crate::error::{Error, Result};

/// Number of results returned when a query does not ask for a specific count
pub const DEFAULT_TOP_K: usize = 3;

/// A similarity query as supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    /// Free-text query
    pub query: String,

    /// Optional metadata filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<DocumentMetadataFilter>,

    /// Maximum number of results (default: 3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl Query {
    /// Create a new query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filter: None,
            top_k: None,
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Restrict the query with a metadata filter
    pub fn with_filter(mut self, filter: DocumentMetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Validate the query and apply the `top_k` default
    pub fn resolve(self) -> Result<ResolvedQuery> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidQuery("query text must not be empty".to_string()));
        }

        let top_k = self.top_k.unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(Error::InvalidQuery(format!(
                "top_k must be a positive integer (query: \"{}\")",
                self.query
            )));
        }

        Ok(ResolvedQuery {
            query: self.query,
            filter: self.filter,
            top_k,
        })
    }
}

/// A validated query with every default applied; this is what backends receive
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub query: String,
    pub filter: Option<DocumentMetadataFilter>,
    pub top_k: usize,
}

/// Results for one query of a batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    /// Echo of the originating query text
    pub query: String,
    /// Matches ordered by descending score
    pub results: Vec<DocumentChunkWithScore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_top_k_is_applied() {
        let resolved = Query::new("hello").resolve().unwrap();
        assert_eq!(resolved.top_k, DEFAULT_TOP_K);
        assert_eq!(resolved.top_k, 3);

        let resolved = Query::new("hello").with_top_k(7).resolve().unwrap();
        assert_eq!(resolved.top_k, 7);
    }

    #[test]
    fn test_invalid_queries_are_rejected() {
        assert!(matches!(
            Query::new("  ").resolve(),
            Err(Error::InvalidQuery(_))
        ));
        assert!(matches!(
            Query::new("hello").with_top_k(0).resolve(),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_query_deserializes_without_optional_fields() {
        let query: Query = serde_json::from_str(r#"{"query": "hello"}"#).unwrap();
        assert_eq!(query, Query::new("hello"));
    }
}
