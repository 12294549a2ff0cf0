//! Result materialization.
//!
//! Executes a compiled query exactly once, parses the response, extracts the
//! ordered entity IDs and hydrates full entities from the primary datastore.
//! The engine's ranking is authoritative for presentation order: hydrated
//! rows are reordered to match the hit order exactly, whatever order the
//! datastore returned them in.

use std::collections::HashMap;

use atrium_engine::{SearchEngineGateway, SearchResponse};
use atrium_profile::MetadataProfile;
use atrium_store::{Datastore, DocumentId, Indexable};
use serde_json::Value;
use tracing::warn;

use crate::{Facet, SearchError};

/// Materialized results for one relation state generation.
pub(crate) struct LoadedResults<E> {
    /// Total matching-document count.
    pub(crate) total: u64,
    /// Primary keys in engine hit order, before hydration.
    pub(crate) ids: Vec<i64>,
    /// Hydrated entities in engine hit order, stale IDs dropped.
    pub(crate) records: Vec<E>,
    /// Facets in profile-element order.
    pub(crate) facets: Vec<Facet>,
    /// Sort-value tuple of the final hit.
    pub(crate) last_sort: Option<Vec<Value>>,
}

/// Executes a compiled query and hydrates the results.
pub(crate) fn materialize<E: Indexable>(
    compiled: &Value,
    gateway: &dyn SearchEngineGateway,
    store: &dyn Datastore<E>,
    profile: Option<&MetadataProfile>,
    aggregations: bool,
) -> Result<LoadedResults<E>, SearchError> {
    let body = gateway.search(compiled)?;
    let response = SearchResponse::from_body(&body, compiled)?;

    let ids = extract_ids::<E>(&response);
    let records = hydrate(store, &ids)?;

    let facets = if aggregations {
        assemble_facets(&response, profile)
    } else {
        Vec::new()
    };

    Ok(LoadedResults {
        total: response.hits.total.value,
        last_sort: response.last_sort_value(),
        ids,
        records,
        facets,
    })
}

/// Maps each hit's engine document ID back to a primary key.
///
/// IDs that do not parse as documents of this entity type are dropped with a
/// diagnostic; the index may hold documents of other types or malformed
/// strays, neither of which should abort the request.
fn extract_ids<E: Indexable>(response: &SearchResponse) -> Vec<i64> {
    response
        .hits
        .hits
        .iter()
        .filter_map(|hit| match DocumentId::parse_for(&hit.id, E::ENTITY_TYPE) {
            Ok(id) => Some(id.pk),
            Err(error) => {
                warn!(id = %hit.id, %error, "dropping hit with foreign document id");
                None
            }
        })
        .collect()
}

/// Fetches entities for the given keys and reorders them to key order.
///
/// Keys with no datastore row indicate a stale index; the hit is dropped
/// with a diagnostic rather than failing the request.
fn hydrate<E: Indexable>(store: &dyn Datastore<E>, ids: &[i64]) -> Result<Vec<E>, SearchError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_id: HashMap<i64, E> = store
        .fetch_many(ids)?
        .into_iter()
        .map(|entity| (entity.id(), entity))
        .collect();

    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        match by_id.remove(id) {
            Some(entity) => records.push(entity),
            None => {
                warn!(
                    entity_type = E::ENTITY_TYPE,
                    pk = id,
                    "indexed document has no datastore row; dropping stale hit"
                );
            }
        }
    }

    Ok(records)
}

/// Builds facets from the response aggregations.
///
/// Facet order follows the profile's element order, not response order;
/// term order within a facet follows bucket response order. Elements whose
/// aggregation is absent yield empty facets.
fn assemble_facets(response: &SearchResponse, profile: Option<&MetadataProfile>) -> Vec<Facet> {
    let Some(profile) = profile else {
        return Vec::new();
    };

    profile
        .facetable_elements()
        .map(|element| {
            let buckets = response
                .aggregations
                .get(&element.keyword_field())
                .map_or(&[][..], |aggregation| &aggregation.buckets);
            Facet::from_buckets(element, buckets)
        })
        .collect()
}
