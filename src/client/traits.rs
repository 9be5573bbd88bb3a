// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::search::SearchBody;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Request rejected: {0}")]
    Request(String),
    #[error("Unsupported query construct: {0}")]
    Unsupported(String),
    #[error("Search backend error: {0}")]
    Backend(String),
}

/// One raw hit as returned by the search engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub id: String,
    /// Document source
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub score: Option<f64>,
    /// Highlight fragments, when highlighting was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Value>,
}

impl RawHit {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
            score: None,
            highlight: None,
        }
    }
}

/// Raw search response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub hits: Vec<RawHit>,
    /// Total matching documents (not just this page)
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub aggregations: Map<String, Value>,
    #[serde(default)]
    pub suggestions: Map<String, Value>,
    /// Server-side execution time in milliseconds
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub timed_out: bool,
}

/// Result of a delete-by-query call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteByQueryResponse {
    pub ok: bool,
    pub deleted: u64,
}

/// Search-engine client.
///
/// Network handling, retries and connection management belong to
/// implementations; errors are passed through to callers unmodified.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one search round trip against `index`.
    async fn execute(&self, index: &str, body: &SearchBody) -> Result<RawResponse, ClientError>;

    /// Delete every document in `index` matching the body's query.
    async fn delete_by_query(
        &self,
        index: &str,
        body: &SearchBody,
    ) -> Result<DeleteByQueryResponse, ClientError>;

    /// Make recent writes visible to search.
    async fn refresh(&self, index: &str) -> Result<(), ClientError>;
}
