//! Client Connection
//!
//! Port resolution and the HTTP request layer.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::BackendConfig;
use crate::types::ErrorBody;

use super::ApiError;

/// File the backend writes its listening port into
pub const PORT_FILE_NAME: &str = "serve.port";

/// `<data_root>/<database>/serve.port`
pub fn port_file_path(data_root: &Path, database: &str) -> PathBuf {
    data_root.join(database).join(PORT_FILE_NAME)
}

/// Read the backend's port for `database`.
///
/// Absent, unreadable or non-numeric files all mean the backend is not
/// serving that database.
pub async fn resolve_port(data_root: &Path, database: &str) -> Result<u16, ApiError> {
    let path = port_file_path(data_root, database);
    let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
        debug!("No port file at {}: {}", path.display(), e);
        ApiError::ServerNotRunning
    })?;

    match contents.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => {
            debug!("Invalid port file contents at {}: {:?}", path.display(), contents);
            Err(ApiError::ServerNotRunning)
        }
    }
}

/// HTTP client for one backend database.
///
/// Holds no per-request state; clones share the underlying connection pool
/// and may be used concurrently.
#[derive(Debug, Clone)]
pub struct QuarryClient {
    http: reqwest::Client,
    data_root: PathBuf,
    database: String,
    host: String,
}

impl QuarryClient {
    /// Create a client from the backend configuration
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            data_root: config.data_root(),
            database: config.database.clone(),
            host: config.host.clone(),
        })
    }

    /// Create a client for `database` under an explicit data root
    pub fn with_data_root(data_root: impl Into<PathBuf>, database: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            data_root: data_root.into(),
            database: database.into(),
            host: "127.0.0.1".to_string(),
        }
    }

    /// Same connection pool, different database
    pub fn for_database(&self, database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..self.clone()
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Resolve the current port from disk (never cached)
    pub async fn resolve_port(&self) -> Result<u16, ApiError> {
        resolve_port(&self.data_root, &self.database).await
    }

    /// Issue `GET /<path>?<params>` and decode the JSON body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let port = self.resolve_port().await?;
        let url = format!(
            "http://{}:{}/{}",
            self.host,
            port,
            path.trim_start_matches('/')
        );

        debug!("GET {} {:?}", url, params);

        let response = self.http.get(&url).query(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(structured) => structured.error,
                Err(_) => body,
            };
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
