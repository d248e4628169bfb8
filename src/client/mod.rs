//! Client Module
//!
//! Talks to the backend's HTTP API. The listening port is not fixed: the
//! backend publishes it in `<data root>/<database>/serve.port`, and every
//! request re-reads that file because the backend may have restarted on a
//! different port since the last call.

pub mod connection;

pub use connection::{port_file_path, resolve_port, QuarryClient, PORT_FILE_NAME};

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{
    CollectionsResponse, DocumentsResponse, HealthResponse, SearchResponse, StatusResponse,
};

/// Errors that can occur when talking to the backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// Port file missing, unreadable or not a port number
    #[error("Server is not running. Start it from the menu or with: quarry serve")]
    ServerNotRunning,

    /// The backend answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connect, DNS or timeout failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx body that does not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decoding(#[from] serde_json::Error),
}

/// Typed operations of the backend API.
///
/// Implemented by [`QuarryClient`]; coordinators hold it as
/// `Arc<dyn QuarryApi>` so tests can substitute a fake backend.
#[async_trait]
pub trait QuarryApi: Send + Sync {
    /// `GET /health`
    async fn health(&self) -> Result<HealthResponse, ApiError>;

    /// `GET /search?q=..&limit=..[&collection=..]`
    async fn search(
        &self,
        query: &str,
        limit: usize,
        collection: Option<&str>,
    ) -> Result<SearchResponse, ApiError>;

    /// `GET /documents[?collection=..]`
    async fn documents(&self, collection: Option<&str>) -> Result<DocumentsResponse, ApiError>;

    /// `GET /collections`
    async fn collections(&self) -> Result<CollectionsResponse, ApiError>;

    /// `GET /status`
    async fn status(&self) -> Result<StatusResponse, ApiError>;
}

#[async_trait]
impl QuarryApi for QuarryClient {
    async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.request("health", &[]).await
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        collection: Option<&str>,
    ) -> Result<SearchResponse, ApiError> {
        let mut params = vec![("q", query.to_string()), ("limit", limit.to_string())];
        if let Some(collection) = collection {
            params.push(("collection", collection.to_string()));
        }
        self.request("search", &params).await
    }

    async fn documents(&self, collection: Option<&str>) -> Result<DocumentsResponse, ApiError> {
        let params: Vec<(&str, String)> = collection
            .map(|c| vec![("collection", c.to_string())])
            .unwrap_or_default();
        self.request("documents", &params).await
    }

    async fn collections(&self) -> Result<CollectionsResponse, ApiError> {
        self.request("collections", &[]).await
    }

    async fn status(&self) -> Result<StatusResponse, ApiError> {
        self.request("status", &[]).await
    }
}
