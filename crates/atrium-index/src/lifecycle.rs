//! Indexed-document lifecycle.
//!
//! [`IndexedLifecycle`] keeps the search index current for one entity type:
//! commit hooks push single-document writes, `reindex_all` rebuilds the
//! whole type over a bounded worker pool, and `delete_orphaned_documents`
//! reconciles documents whose datastore row is gone.
//!
//! Commit hooks fire after the datastore transaction has committed. An
//! index-write failure is logged and returned to the caller for operational
//! follow-up; it can never roll back the committed datastore change.
//! Routine commits and bulk reindexing may write the same document
//! concurrently; both are last-write-wins at document-ID granularity.

use std::{slice, sync::Arc};

use atrium_engine::SearchEngineGateway;
use atrium_search::Relation;
use atrium_store::{Datastore, DocumentId, Indexable};

use crate::{
    IndexError,
    distribute::{ProgressReporter, WorkDistributor},
};

/// Page size used when walking the index during orphan reconciliation.
const ORPHAN_PAGE_SIZE: usize = 500;

/// Summary of a bulk reindex run.
#[derive(Debug, Clone, Default)]
pub struct ReindexStats {
    /// Number of datastore rows visited.
    pub entities_total: usize,
    /// Number of documents successfully written.
    pub entities_indexed: usize,
    /// Failures captured in rescue mode (primary key, error message).
    pub errors: Vec<(i64, String)>,
}

impl ReindexStats {
    /// Returns true if every visited entity was indexed.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Index synchronization for one indexable entity type.
pub struct IndexedLifecycle<E: Indexable> {
    /// Wire seam to the search engine.
    gateway: Arc<dyn SearchEngineGateway>,
    /// Source of truth for the entity type.
    store: Arc<dyn Datastore<E>>,
}

impl<E: Indexable> IndexedLifecycle<E> {
    /// Creates a lifecycle over the given collaborators.
    pub fn new(gateway: Arc<dyn SearchEngineGateway>, store: Arc<dyn Datastore<E>>) -> Self {
        Self { gateway, store }
    }

    /// Writes the entity's current state to the index.
    pub fn index_entity(&self, entity: &E) -> Result<(), IndexError> {
        self.gateway
            .index_document(&entity.document_id(), &entity.to_document())?;
        Ok(())
    }

    /// Deletes the document for the given primary key.
    pub fn remove_entity(&self, id: i64) -> Result<(), IndexError> {
        self.gateway
            .delete_document(&DocumentId::new(E::ENTITY_TYPE, id))?;
        Ok(())
    }

    /// Commit hook for creates and updates.
    pub fn after_save_commit(&self, entity: &E) -> Result<(), IndexError> {
        self.index_entity(entity).inspect_err(|error| {
            tracing::error!(
                entity_type = E::ENTITY_TYPE,
                id = entity.id(),
                %error,
                "index write after commit failed"
            );
        })
    }

    /// Commit hook for destroys.
    pub fn after_destroy_commit(&self, id: i64) -> Result<(), IndexError> {
        self.remove_entity(id).inspect_err(|error| {
            tracing::error!(
                entity_type = E::ENTITY_TYPE,
                id,
                %error,
                "index delete after commit failed"
            );
        })
    }

    /// Re-submits every entity of the type, in primary-key order.
    ///
    /// Work is spread over `workers` threads via [`WorkDistributor`]. With
    /// `rescue_errors` set, per-entity failures are collected into the
    /// returned stats and the run continues; otherwise the first failure
    /// aborts. Rows deleted between listing and fetch are skipped.
    ///
    /// Orphaned documents are not touched here; that is the separate, more
    /// expensive [`IndexedLifecycle::delete_orphaned_documents`] pass.
    pub fn reindex_all(
        &self,
        workers: usize,
        rescue_errors: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<ReindexStats, IndexError> {
        let ids = self.store.all_ids()?;

        let failures = WorkDistributor::new(workers).run(&ids, rescue_errors, reporter, |id| {
            let mut rows = self.store.fetch_many(slice::from_ref(id))?;
            match rows.pop() {
                Some(entity) => self.index_entity(&entity),
                None => Ok(()),
            }
        })?;

        Ok(ReindexStats {
            entities_total: ids.len(),
            entities_indexed: ids.len() - failures.len(),
            errors: failures
                .into_iter()
                .map(|failure| (ids[failure.index], failure.message))
                .collect(),
        })
    }

    /// Deletes every document whose datastore row no longer exists.
    ///
    /// Walks the whole index in `search_after` pages ordered by the unique
    /// `id` field, so it is O(index size) and meant as a maintenance pass,
    /// not a hot path. Returns the number of documents deleted.
    pub fn delete_orphaned_documents(&self) -> Result<usize, IndexError> {
        let mut removed = 0;
        let mut cursor = None;

        loop {
            let mut page =
                Relation::<E>::new(Arc::clone(&self.gateway), Arc::clone(&self.store));
            page.order("id").limit(ORPHAN_PAGE_SIZE);
            if let Some(sort_values) = cursor {
                page.search_after(sort_values);
            }

            let ids = page.record_ids()?.to_vec();
            if ids.is_empty() {
                break;
            }

            for id in ids {
                if !self.store.exists(id)? {
                    tracing::warn!(
                        entity_type = E::ENTITY_TYPE,
                        id,
                        "deleting orphaned index document"
                    );
                    self.remove_entity(id)?;
                    removed += 1;
                }
            }

            cursor = page.last_sort_value()?;
            if cursor.is_none() {
                break;
            }
        }

        Ok(removed)
    }
}
