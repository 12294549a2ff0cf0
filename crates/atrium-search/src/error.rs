//! Error types for the atrium search core.

use atrium_engine::EngineError;
use atrium_store::StoreError;
use thiserror::Error;

/// Error during query compilation.
///
/// Compile errors are caller misuse detected before any network call; the
/// builder itself never fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Both offset (`start`/`limit`) and cursor (`search_after`) pagination
    /// are set on the same relation state.
    #[error("offset and cursor pagination are mutually exclusive")]
    ConflictingPagination,

    /// A structured date term does not denote a real calendar date.
    #[error("invalid date term: {0}")]
    InvalidDate(String),
}

/// Errors raised while building or materializing a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The relation state could not be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The search engine reported a failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The primary datastore failed during hydration.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Facets were read from a relation that never requested aggregations.
    #[error("facets requested but aggregations were not enabled on this relation")]
    FacetsDisabled,
}
