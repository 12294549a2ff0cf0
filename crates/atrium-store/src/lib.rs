//! Primary-datastore and indexable-entity seams for atrium.
//!
//! The search core never talks to the repository database directly. Instead
//! it consumes two narrow traits: [`Indexable`], implemented per entity type
//! (units, collections, items), and [`Datastore`], the batch-lookup surface
//! of the primary store. Both are object-safe seams so tests can inject
//! in-memory doubles.

#![warn(missing_docs)]

mod id;
mod memory;

pub use id::{DocumentId, IdError};
pub use memory::MemoryStore;
use thiserror::Error;

/// Errors surfaced by a [`Datastore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A lookup against the primary datastore failed.
    #[error("datastore lookup failed: {0}")]
    Lookup(String),
}

/// An entity type that can be mirrored into the search engine.
///
/// Implementations serialize the entity's current state into a JSON document
/// whose shape follows the index conventions: a `class` discriminator, an
/// `institution_key` tenant field, timestamps, and per-element searchable
/// fields (with untokenized `.keyword` variants for exact matching).
pub trait Indexable {
    /// Lowercase entity type discriminator, also the document-ID prefix.
    const ENTITY_TYPE: &'static str;

    /// Primary key in the datastore.
    fn id(&self) -> i64;

    /// Serializes the entity's current state as an engine document.
    fn to_document(&self) -> serde_json::Value;

    /// Derives the engine document ID (`entity_type:pk`).
    fn document_id(&self) -> DocumentId {
        DocumentId::new(Self::ENTITY_TYPE, self.id())
    }
}

/// Batch-lookup surface of the primary datastore for one entity type.
///
/// No ordering is guaranteed by `fetch_many`; callers that care about
/// presentation order must reorder the returned rows themselves.
pub trait Datastore<E: Indexable>: Send + Sync {
    /// Fetches the entities with the given primary keys.
    ///
    /// Keys with no matching row are silently absent from the result.
    fn fetch_many(&self, ids: &[i64]) -> Result<Vec<E>, StoreError>;

    /// Returns whether a row with the given primary key exists.
    fn exists(&self, id: i64) -> Result<bool, StoreError>;

    /// Returns every primary key of the entity type, in ascending order.
    fn all_ids(&self) -> Result<Vec<i64>, StoreError>;
}
