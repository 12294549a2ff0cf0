//! In-memory datastore.
//!
//! A reference [`Datastore`] implementation over a `BTreeMap`, used as the
//! test double across the workspace. Reads take a shared lock so concurrent
//! reindex workers can fetch their ranges in parallel.

use std::{collections::BTreeMap, sync::RwLock};

use crate::{Datastore, Indexable, StoreError};

/// An in-memory datastore keyed by primary key.
#[derive(Debug, Default)]
pub struct MemoryStore<E> {
    /// Rows ordered by primary key.
    rows: RwLock<BTreeMap<i64, E>>,
}

impl<E: Indexable + Clone> MemoryStore<E> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    /// Inserts or replaces an entity under its own primary key.
    pub fn insert(&self, entity: E) {
        self.rows.write().unwrap().insert(entity.id(), entity);
    }

    /// Removes an entity by primary key, returning it if present.
    pub fn remove(&self, id: i64) -> Option<E> {
        self.rows.write().unwrap().remove(&id)
    }

    /// Returns the number of stored entities.
    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    /// Returns true if the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.rows.read().unwrap().is_empty()
    }
}

impl<E: Indexable + Clone + Send + Sync> Datastore<E> for MemoryStore<E> {
    fn fetch_many(&self, ids: &[i64]) -> Result<Vec<E>, StoreError> {
        let rows = self.rows.read().unwrap();
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    fn exists(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.rows.read().unwrap().contains_key(&id))
    }

    fn all_ids(&self) -> Result<Vec<i64>, StoreError> {
        Ok(self.rows.read().unwrap().keys().copied().collect())
    }
}
