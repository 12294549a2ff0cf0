//! Error type for lifecycle and reindex operations.

use atrium_engine::EngineError;
use atrium_search::SearchError;
use atrium_store::StoreError;
use thiserror::Error;

/// Errors raised while synchronizing the index with the datastore.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A gateway call failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A datastore lookup failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Paging the index during orphan reconciliation failed.
    #[error(transparent)]
    Search(#[from] SearchError),
}
