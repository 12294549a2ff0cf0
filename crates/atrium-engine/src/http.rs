//! HTTP gateway implementation.
//!
//! Talks to a single search index over its REST endpoint. The gateway is
//! deliberately thin: send JSON, return the parsed JSON body, raise on
//! transport or HTTP errors. It never retries and never inspects the body
//! beyond what an error status requires.

use std::time::Duration;

use atrium_store::DocumentId;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{EngineError, SearchEngineGateway};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Serde default helper for the timeout.
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Connection settings for the search engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the engine, e.g. `http://localhost:9200`.
    pub endpoint: String,
    /// Index or alias name all operations target.
    pub index: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl EngineConfig {
    /// Creates a config with the default timeout.
    pub fn new(endpoint: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            index: index.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// A [`SearchEngineGateway`] over the engine's HTTP/JSON protocol.
pub struct HttpGateway {
    /// Shared blocking HTTP client.
    client: Client,
    /// Connection settings.
    config: EngineConfig,
}

impl HttpGateway {
    /// Creates a gateway from connection settings.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Builds the URL for a document operation.
    fn document_url(&self, id: &DocumentId) -> String {
        format!(
            "{}/{}/_doc/{}",
            self.config.endpoint, self.config.index, id
        )
    }

    /// Reads a response, mapping non-success statuses to [`EngineError`].
    fn read_json(response: reqwest::blocking::Response) -> Result<Value, EngineError> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(EngineError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| EngineError::Transport(e.to_string()))
    }
}

impl SearchEngineGateway for HttpGateway {
    fn search(&self, query: &Value) -> Result<Value, EngineError> {
        let url = format!("{}/{}/_search", self.config.endpoint, self.config.index);
        debug!(index = %self.config.index, "executing search request");

        let response = self
            .client
            .post(&url)
            .json(query)
            .send()
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        Self::read_json(response)
    }

    fn index_document(&self, id: &DocumentId, document: &Value) -> Result<(), EngineError> {
        let response = self
            .client
            .put(self.document_url(id))
            .json(document)
            .send()
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        Self::read_json(response).map(|_| ())
    }

    fn delete_document(&self, id: &DocumentId) -> Result<(), EngineError> {
        let response = self
            .client
            .delete(self.document_url(id))
            .send()
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        // Deleting an already-absent document is a success: the index state
        // matches what the caller asked for.
        if response.status().as_u16() == 404 {
            debug!(%id, "delete of missing document");
            return Ok(());
        }

        Self::read_json(response).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_deserializes_with_default_timeout() {
        let config: EngineConfig = toml_like(
            r#"{"endpoint": "http://localhost:9200", "index": "atrium"}"#,
        );
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.index, "atrium");
    }

    #[test]
    fn config_honors_explicit_timeout() {
        let config: EngineConfig = toml_like(
            r#"{"endpoint": "http://localhost:9200", "index": "atrium", "timeout_secs": 5}"#,
        );
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn document_url_uses_derived_id() {
        let gateway = HttpGateway::new(EngineConfig::new("http://localhost:9200", "atrium"))
            .unwrap();
        let id = DocumentId::new("item", 42);
        assert_eq!(
            gateway.document_url(&id),
            "http://localhost:9200/atrium/_doc/item:42"
        );
    }

    /// Parses a config from JSON, which shares serde semantics with TOML.
    fn toml_like(json: &str) -> EngineConfig {
        serde_json::from_str(json).unwrap()
    }
}
