//! Index synchronization for atrium.
//!
//! Keeps the search engine's documents in step with the primary datastore:
//! commit-triggered single-document writes, bounded-parallel bulk
//! reindexing, and orphaned-document reconciliation. The search index is
//! eventually consistent with the datastore; concurrent writers resolve by
//! last write wins per document ID.

#![warn(missing_docs)]

mod distribute;
mod error;
mod lifecycle;

pub use distribute::{
    ItemFailure, MAX_BATCH_SIZE, NullReporter, ProgressReporter, WorkDistributor,
};
pub use error::IndexError;
pub use lifecycle::{IndexedLifecycle, ReindexStats};
