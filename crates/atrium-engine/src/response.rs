//! Parsed search responses.
//!
//! The gateway hands back raw JSON; this module turns it into typed hits and
//! aggregation buckets, distinguishing a genuine zero-hit result from an
//! engine-side error by response shape, never by count.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::EngineError;

/// A parsed search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Hit metadata and the ordered hit list.
    pub hits: Hits,
    /// Terms aggregations keyed by field, when requested.
    #[serde(default)]
    pub aggregations: BTreeMap<String, Aggregation>,
}

/// The `hits` object of a response.
#[derive(Debug, Clone, Deserialize)]
pub struct Hits {
    /// Total matching-document count.
    pub total: TotalHits,
    /// Hits in engine ranking/sort order.
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// The `hits.total` object.
#[derive(Debug, Clone, Deserialize)]
pub struct TotalHits {
    /// Number of matching documents.
    pub value: u64,
}

/// One hit of a response.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    /// Engine document ID.
    #[serde(rename = "_id")]
    pub id: String,
    /// Relevance score; absent when sorting suppresses scoring.
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    /// Sort-value tuple, present when the query carried a sort.
    pub sort: Option<Vec<Value>>,
}

/// One terms aggregation of a response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Aggregation {
    /// Buckets in engine response order.
    #[serde(default)]
    pub buckets: Vec<AggregationBucket>,
}

/// One bucket of a terms aggregation.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationBucket {
    /// The discrete field value.
    pub key: Value,
    /// Number of matching documents carrying that value.
    pub doc_count: u64,
}

impl SearchResponse {
    /// Parses a raw response body.
    ///
    /// A body carrying an `error` object becomes [`EngineError::Engine`]; a
    /// body with neither `error` nor `hits` is malformed. `request` is the
    /// compiled query, attached to errors for diagnosis.
    pub fn from_body(body: &Value, request: &Value) -> Result<Self, EngineError> {
        if let Some(error) = body.get("error") {
            return Err(EngineError::from_error_body(error, request));
        }

        if body.get("hits").is_none() {
            return Err(EngineError::MalformedResponse {
                detail: "response has no hits structure".to_string(),
                request: request.to_string(),
            });
        }

        serde_json::from_value(body.clone()).map_err(|e| EngineError::MalformedResponse {
            detail: e.to_string(),
            request: request.to_string(),
        })
    }

    /// Returns the sort-value tuple of the final hit.
    ///
    /// `None` means the page had no hits, which signals cursor exhaustion to
    /// `search_after` pagination loops.
    pub fn last_sort_value(&self) -> Option<Vec<Value>> {
        self.hits.hits.last().and_then(|hit| hit.sort.clone())
    }
}
