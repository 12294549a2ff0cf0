//! Error types for the engine gateway.

use thiserror::Error;

/// Errors raised when talking to the search engine.
///
/// Engine-reported failures always carry the engine's own `type` and
/// `reason` fields plus the original request body, so an operator can replay
/// the failing query. The gateway never retries; retry policy belongs to
/// whoever owns the HTTP transport.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The HTTP request could not be completed.
    #[error("search engine request failed: {0}")]
    Transport(String),

    /// The engine answered with a non-success HTTP status.
    #[error("search engine returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the engine.
        body: String,
    },

    /// The response body carried an `error` object.
    #[error("search engine error [{error_type}]: {reason} (request: {request})")]
    Engine {
        /// Engine-reported error type.
        error_type: String,
        /// Engine-reported reason.
        reason: String,
        /// First root cause, when the engine reports one.
        root_cause: Option<String>,
        /// The original request body, serialized for diagnosis.
        request: String,
    },

    /// The response had no `hits` structure and no `error` object.
    #[error("malformed search engine response: {detail} (request: {request})")]
    MalformedResponse {
        /// What was missing or unreadable.
        detail: String,
        /// The original request body, serialized for diagnosis.
        request: String,
    },
}

impl EngineError {
    /// Builds an [`EngineError::Engine`] from a response body's `error` object.
    ///
    /// Falls back to `"unknown"` for fields the engine did not populate.
    pub(crate) fn from_error_body(error: &serde_json::Value, request: &serde_json::Value) -> Self {
        let str_at = |value: &serde_json::Value, key: &str| {
            value
                .get(key)
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown")
                .to_string()
        };

        let root_cause = error
            .get("root_cause")
            .and_then(|causes| causes.get(0))
            .and_then(|cause| cause.get("reason"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        Self::Engine {
            error_type: str_at(error, "type"),
            reason: str_at(error, "reason"),
            root_cause,
            request: request.to_string(),
        }
    }
}
