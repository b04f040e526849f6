use async_trait::async_trait;
use serde::Deserialize;

use crate::record::Document;

/// One document submission.
#[derive(Debug, Clone)]
pub struct IndexRequest {
    pub index: String,
    pub doc_type: String,
    /// Engine-side durability hint, passed through untouched.
    pub consistency: String,
    pub body: Document,
}

/// Engine acknowledgement for an indexed document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndexResponse {
    #[serde(rename = "_index", default)]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PutTemplateRequest {
    pub name: String,
    pub body: serde_json::Value,
    /// Fail instead of overwriting when the template already exists.
    pub create: bool,
}

/// Query-string search against a single index.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub index: String,
    pub query: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub hits: Hits,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: HitsTotal,
    #[serde(default)]
    pub hits: Vec<serde_json::Value>,
}

/// Older engines report a bare number, newer ones `{ "value", "relation" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HitsTotal {
    Count(u64),
    Detailed { value: u64, relation: String },
}

impl HitsTotal {
    pub fn value(&self) -> u64 {
        match self {
            HitsTotal::Count(n) => *n,
            HitsTotal::Detailed { value, .. } => *value,
        }
    }
}

impl Default for HitsTotal {
    fn default() -> Self {
        HitsTotal::Count(0)
    }
}

/// Error type returned by [`SearchClient`] calls.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("search engine responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[cfg(feature = "elasticsearch")]
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("search engine unavailable: {0}")]
    Unavailable(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

/// Remote search engine operations the shipper depends on.
///
/// Implementations must be cheap to share: a single instance serves the
/// connection monitor and every in-flight write concurrently.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Check that the engine answers at all.
    async fn ping(&self) -> Result<(), ClientError>;

    /// Submit one document.
    async fn index(&self, request: &IndexRequest) -> Result<IndexResponse, ClientError>;

    /// Fetch an index template.
    ///
    /// **Returns**
    /// - `Err(ClientError::NotFound(..))` if the template does not exist.
    async fn get_template(&self, name: &str) -> Result<serde_json::Value, ClientError>;

    async fn put_template(&self, request: &PutTemplateRequest) -> Result<serde_json::Value, ClientError>;

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ClientError>;
}
