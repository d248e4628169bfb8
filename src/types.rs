//! Core types shared by the coordinators and the API client

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Database Discovery Types
// ============================================================================

/// A database known to the backend tooling.
///
/// `name` is the identity key; two entries with the same name refer to the
/// same database even if their counts differ between discoveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Unique database name (used with `serve --db <name>`)
    pub name: String,
    /// Number of indexed documents
    pub document_count: u64,
    /// On-disk size in bytes
    pub size_bytes: u64,
    /// Human readable size, e.g. "12.4 MB"
    pub size_description: String,
}

impl DatabaseInfo {
    /// Create a database entry, deriving the size description from the byte count
    pub fn new(name: impl Into<String>, document_count: u64, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            document_count,
            size_bytes,
            size_description: crate::util::describe_size(size_bytes),
        }
    }

    /// Identity key
    pub fn key(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Search Types
// ============================================================================

/// A single chunk returned by `GET /search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_name: String,
    pub collection: String,
    pub page_number: u32,
    pub chunk_index: u32,
    pub text: String,
    pub page_type: String,
    pub source_format: String,
    /// Cosine similarity in 0..1
    pub similarity: f32,
}

impl SearchResult {
    /// Identity within one result set
    pub fn id(&self) -> ResultId {
        ResultId {
            document_name: self.document_name.clone(),
            page_number: self.page_number,
            chunk_index: self.chunk_index,
        }
    }
}

/// Identity key of a [`SearchResult`]: document name + page + chunk.
///
/// Not unique across collections, but unique inside the results of one query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultId {
    pub document_name: String,
    pub page_number: u32,
    pub chunk_index: u32,
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.document_name, self.page_number, self.chunk_index)
    }
}

// ============================================================================
// HTTP API Response Shapes
// ============================================================================

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
}

/// `GET /search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub total_results: usize,
    pub results: Vec<SearchResult>,
}

/// A document entry from `GET /documents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub document_name: String,
    pub collection: String,
    #[serde(default)]
    pub document_path: Option<String>,
    #[serde(default)]
    pub indexed_pages: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub chunk_count: u64,
    #[serde(default)]
    pub ingestion_timestamp: Option<String>,
}

/// `GET /documents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentsResponse {
    pub total_documents: usize,
    pub documents: Vec<DocumentInfo>,
}

/// A collection entry from `GET /collections`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub collection: String,
    pub document_count: u64,
    pub chunk_count: u64,
}

/// `GET /collections`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionsResponse {
    pub total_collections: usize,
    pub collections: Vec<CollectionInfo>,
}

/// `GET /status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub document_count: u64,
    pub collection_count: u64,
    pub chunk_count: u64,
    pub database_path: String,
    pub database_size_bytes: u64,
    pub embedding_model: String,
    pub embedding_dimension: u32,
}

/// Structured error body returned by the backend on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
