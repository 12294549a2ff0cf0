//! HTTP/JSON search-engine gateway for atrium.
//!
//! The repository's search engine is a remote document store reached over a
//! REST endpoint. This crate owns the wire seam: the [`SearchEngineGateway`]
//! trait the core programs against, the [`HttpGateway`] production
//! implementation, and the typed [`SearchResponse`] parsed from raw bodies.
//! Everything above this crate injects the gateway explicitly, so tests swap
//! in doubles without touching the network.

#![warn(missing_docs)]

mod error;
mod http;
mod response;

use atrium_store::DocumentId;
pub use error::EngineError;
pub use http::{EngineConfig, HttpGateway};
pub use response::{Aggregation, AggregationBucket, Hit, Hits, SearchResponse, TotalHits};
use serde_json::Value;

/// Hard ceiling on `from + size` offset pagination.
///
/// The engine refuses result windows past this depth; traversals beyond it
/// must switch to `search_after` cursors.
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// Wire seam to the search engine.
///
/// Implementations send a JSON query document to the configured index and
/// return the parsed JSON response, or raise on transport/HTTP failure. They
/// do not interpret response bodies; that is the caller's job.
pub trait SearchEngineGateway: Send + Sync {
    /// Executes a search request and returns the raw response body.
    fn search(&self, query: &Value) -> Result<Value, EngineError>;

    /// Writes (or overwrites) a document under its ID.
    fn index_document(&self, id: &DocumentId, document: &Value) -> Result<(), EngineError>;

    /// Deletes the document with the given ID.
    ///
    /// Deleting an absent document is not an error.
    fn delete_document(&self, id: &DocumentId) -> Result<(), EngineError>;
}
