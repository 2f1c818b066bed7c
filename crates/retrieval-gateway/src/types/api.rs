//! Request and response bodies of the HTTP surface

use serde::{Deserialize, Serialize};

use super::document::Document;
use super::query::{Query, QueryResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpsertResponse {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub queries: Vec<Query>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub results: Vec<QueryResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteResponse {
    pub success: bool,
}
