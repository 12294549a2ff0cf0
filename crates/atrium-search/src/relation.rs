//! The chainable query relation.
//!
//! A [`Relation`] is the per-request, mutable query state for one searchable
//! entity type. Builder methods mutate and return the same instance so calls
//! chain; none of them validate anything. Validation happens at compile
//! time, execution at first result access. Results are memoized until the
//! next mutation: any builder call invalidates the cached load, so a stale
//! result is never served.

use std::sync::Arc;

use atrium_engine::SearchEngineGateway;
use atrium_profile::{Institution, MetadataProfile};
use atrium_store::{Datastore, Indexable};
use serde_json::Value;

use crate::{
    CompileError, Facet, SearchError, TermInput,
    compile::compile,
    result::{LoadedResults, materialize},
};

/// Default number of buckets requested per facet aggregation.
pub const DEFAULT_BUCKET_LIMIT: usize = 10;

/// The engine's relevance-score pseudo-field.
pub const SCORE_FIELD: &str = "_score";

/// Sort direction for an explicit order entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Range comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Lte,
}

impl RangeOp {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }
}

/// A filter value: a scalar (exact term match) or a set (OR of terms).
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Exact match on one value.
    One(Value),
    /// Match any of the values.
    Many(Vec<Value>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::One(Value::from(value))
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::One(Value::from(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::One(Value::from(value))
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::One(Value::from(value))
    }
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        Self::One(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Field scope of the single free-text query.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum QueryFields {
    /// Exactly the fields the caller named (with any `^weight` suffixes).
    Explicit(Vec<String>),
    /// The active profile's searchable elements plus the full-text field,
    /// expanded with weights at compile time.
    Searchable,
    /// No field restriction; the engine searches all fields.
    All,
}

/// Sort state of a relation.
///
/// `Relevance` (the initial state, engine ranking) is deliberately distinct
/// from `Unsorted` (natural index order, scoring suppressed).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortMode {
    /// Default relevance ordering: no sort clause is emitted.
    Relevance,
    /// Sorting disabled entirely; documents come back in index order.
    Unsorted,
    /// Explicit field orderings, applied in sequence.
    Fields(Vec<(String, SortDirection)>),
}

/// The compiled-from query state of one relation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RelationState {
    /// Exact/set filters, ANDed in order.
    pub(crate) filters: Vec<(String, FilterValue)>,
    /// Exclusion filters.
    pub(crate) must_not_filters: Vec<(String, FilterValue)>,
    /// Range constraints.
    pub(crate) filter_ranges: Vec<(String, RangeOp, Value)>,
    /// Range exclusions.
    pub(crate) must_not_ranges: Vec<(String, RangeOp, Value)>,
    /// Independent per-field match queries (advanced search).
    pub(crate) multi_queries: Vec<(String, TermInput)>,
    /// The single weighted free-text query, when set.
    pub(crate) query: Option<(QueryFields, TermInput)>,
    /// Sort state.
    pub(crate) sort: SortMode,
    /// Offset pagination: starting offset.
    pub(crate) start: Option<usize>,
    /// Offset pagination: page size (also used with cursors).
    pub(crate) limit: Option<usize>,
    /// Cursor pagination: sort-value tuple of the previous page's last hit.
    pub(crate) search_after: Option<Vec<Value>>,
    /// Whether facet aggregations are compiled.
    pub(crate) aggregations: bool,
    /// Bucket count per facet aggregation.
    pub(crate) bucket_limit: usize,
    /// Tenant scope, when set through [`Relation::institution`].
    pub(crate) institution_key: Option<String>,
    /// Metadata-profile scope supplying field weights and facet fields.
    pub(crate) profile: Option<MetadataProfile>,
}

impl Default for RelationState {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            must_not_filters: Vec::new(),
            filter_ranges: Vec::new(),
            must_not_ranges: Vec::new(),
            multi_queries: Vec::new(),
            query: None,
            sort: SortMode::Relevance,
            start: None,
            limit: None,
            search_after: None,
            aggregations: false,
            bucket_limit: DEFAULT_BUCKET_LIMIT,
            institution_key: None,
            profile: None,
        }
    }
}

/// A chainable, lazily-executed search over one entity type.
pub struct Relation<E: Indexable> {
    /// Builder state, compiled on first access.
    state: RelationState,
    /// Wire seam to the search engine.
    gateway: Arc<dyn SearchEngineGateway>,
    /// Hydration source.
    store: Arc<dyn Datastore<E>>,
    /// Memoized results for the current state generation.
    loaded: Option<LoadedResults<E>>,
}

impl<E: Indexable> Relation<E> {
    /// Creates an empty relation over the given collaborators.
    ///
    /// Each search request must use its own relation; instances are not
    /// shared across threads.
    pub fn new(gateway: Arc<dyn SearchEngineGateway>, store: Arc<dyn Datastore<E>>) -> Self {
        Self {
            state: RelationState::default(),
            gateway,
            store,
            loaded: None,
        }
    }

    /// Invalidates the memoized load after a mutation.
    fn touch(&mut self) -> &mut Self {
        self.loaded = None;
        self
    }

    /// Appends an exact filter on a field.
    ///
    /// A set value matches any member (OR); a scalar matches exactly.
    /// Calling this twice for the same field appends two independent
    /// entries, ANDed together, so repeated narrowing works.
    pub fn filter(&mut self, field: &str, value: impl Into<FilterValue>) -> &mut Self {
        self.state.filters.push((field.to_string(), value.into()));
        self.touch()
    }

    /// Appends an exclusion filter on a field.
    pub fn must_not(&mut self, field: &str, value: impl Into<FilterValue>) -> &mut Self {
        self.state
            .must_not_filters
            .push((field.to_string(), value.into()));
        self.touch()
    }

    /// Appends a range constraint on a field.
    pub fn filter_range(&mut self, field: &str, op: RangeOp, value: impl Into<Value>) -> &mut Self {
        self.state
            .filter_ranges
            .push((field.to_string(), op, value.into()));
        self.touch()
    }

    /// Appends a range exclusion on a field.
    pub fn must_not_range(
        &mut self,
        field: &str,
        op: RangeOp,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.state
            .must_not_ranges
            .push((field.to_string(), op, value.into()));
        self.touch()
    }

    /// Appends an independent per-field match query (advanced search).
    ///
    /// Blank terms are silently ignored. Unlike [`Relation::query`], these
    /// clauses carry no field weighting, so they are unsuitable for ranked
    /// full-text search.
    pub fn multi_query(&mut self, field: &str, term: impl Into<TermInput>) -> &mut Self {
        let term = term.into();
        if term.is_blank() {
            return self;
        }
        self.state.multi_queries.push((field.to_string(), term));
        self.touch()
    }

    /// Sets the single free-text query over an explicit field list.
    ///
    /// Fields may carry `^weight` suffixes. At most one query is meaningful
    /// per execution; a later call replaces the earlier one.
    pub fn query(&mut self, fields: Vec<String>, term: impl Into<TermInput>) -> &mut Self {
        let term = term.into();
        if term.is_blank() {
            return self;
        }
        self.state.query = Some((QueryFields::Explicit(fields), term));
        self.touch()
    }

    /// Sets the single free-text query over all fields.
    pub fn query_all(&mut self, term: impl Into<TermInput>) -> &mut Self {
        let term = term.into();
        if term.is_blank() {
            return self;
        }
        self.state.query = Some((QueryFields::All, term));
        self.touch()
    }

    /// Sets the single free-text query over the profile's searchable fields.
    ///
    /// The field list is expanded at compile time from the active
    /// metadata-profile scope: every searchable element annotated with its
    /// relevance weight, plus the full-text field.
    pub fn query_searchable_fields(&mut self, term: impl Into<TermInput>) -> &mut Self {
        let term = term.into();
        if term.is_blank() {
            return self;
        }
        self.state.query = Some((QueryFields::Searchable, term));
        self.touch()
    }

    /// Appends an ascending order on a field.
    ///
    /// A blank field name normalizes to the relevance-score field.
    pub fn order(&mut self, field: &str) -> &mut Self {
        self.order_by(field, SortDirection::Asc)
    }

    /// Appends an explicit order on a field.
    pub fn order_by(&mut self, field: &str, direction: SortDirection) -> &mut Self {
        let field = if field.trim().is_empty() {
            SCORE_FIELD.to_string()
        } else {
            field.to_string()
        };

        match &mut self.state.sort {
            SortMode::Fields(orders) => orders.push((field, direction)),
            _ => self.state.sort = SortMode::Fields(vec![(field, direction)]),
        }
        self.touch()
    }

    /// Disables sorting entirely, falling back to the engine's natural order.
    ///
    /// Distinct from never calling `order`, which keeps default relevance
    /// ranking.
    pub fn unsorted(&mut self) -> &mut Self {
        self.state.sort = SortMode::Unsorted;
        self.touch()
    }

    /// Scopes the query to one institution.
    ///
    /// Adds an exact filter on the tenant key field and, when no profile
    /// scope is set yet, adopts the institution's default profile. An
    /// explicit [`Relation::profile`] call wins regardless of order.
    pub fn institution(&mut self, institution: &Institution) -> &mut Self {
        self.state.institution_key = Some(institution.key.clone());
        self.state.filters.push((
            atrium_profile::INSTITUTION_KEY_FIELD.to_string(),
            FilterValue::One(Value::from(institution.key.as_str())),
        ));
        if self.state.profile.is_none() {
            self.state.profile = Some(institution.default_profile.clone());
        }
        self.touch()
    }

    /// Sets the metadata-profile scope explicitly.
    pub fn profile(&mut self, profile: MetadataProfile) -> &mut Self {
        self.state.profile = Some(profile);
        self.touch()
    }

    /// Sets the offset of offset-based pagination.
    pub fn start(&mut self, start: usize) -> &mut Self {
        self.state.start = Some(start);
        self.touch()
    }

    /// Sets the page size.
    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.state.limit = Some(limit);
        self.touch()
    }

    /// Sets the cursor for search-after pagination, clearing any offset.
    ///
    /// The cursor is the previous page's [`Relation::last_sort_value`].
    /// Callers traversing very large result sets must order by a unique
    /// tiebreaker field (e.g. `id`) first, or full-traversal correctness is
    /// not guaranteed.
    pub fn search_after(&mut self, sort_values: Vec<Value>) -> &mut Self {
        self.state.start = None;
        self.state.search_after = Some(sort_values);
        self.touch()
    }

    /// Enables or disables facet aggregations.
    pub fn aggregations(&mut self, enabled: bool) -> &mut Self {
        self.state.aggregations = enabled;
        self.touch()
    }

    /// Sets the bucket count requested per facet.
    pub fn bucket_limit(&mut self, limit: usize) -> &mut Self {
        self.state.bucket_limit = limit;
        self.touch()
    }

    /// Compiles the current state to the engine's query DSL without
    /// executing it.
    pub fn to_query(&self) -> Result<Value, CompileError> {
        compile(&self.state, E::ENTITY_TYPE)
    }

    /// Compiles and executes the query once per state generation.
    fn ensure_loaded(&mut self) -> Result<&LoadedResults<E>, SearchError> {
        if self.loaded.is_none() {
            let compiled = compile(&self.state, E::ENTITY_TYPE)?;
            let results = materialize(
                &compiled,
                self.gateway.as_ref(),
                self.store.as_ref(),
                self.state.profile.as_ref(),
                self.state.aggregations,
            )?;
            self.loaded = Some(results);
        }
        match &self.loaded {
            Some(loaded) => Ok(loaded),
            None => unreachable!("relation was loaded above"),
        }
    }

    /// Total matching-document count.
    pub fn total_count(&mut self) -> Result<u64, SearchError> {
        Ok(self.ensure_loaded()?.total)
    }

    /// Hydrated entities, in engine ranking/sort order.
    ///
    /// IDs with no live datastore row are dropped with a diagnostic.
    pub fn records(&mut self) -> Result<&[E], SearchError> {
        Ok(&self.ensure_loaded()?.records)
    }

    /// Primary keys extracted from the hits, in engine order, without
    /// hydration. Includes keys whose datastore row may be gone.
    pub fn record_ids(&mut self) -> Result<&[i64], SearchError> {
        Ok(&self.ensure_loaded()?.ids)
    }

    /// Facets assembled from the response aggregations, in profile order.
    ///
    /// Reading facets from a relation that never enabled aggregations is
    /// caller misuse and fails, never silently returns empty.
    pub fn facets(&mut self) -> Result<&[Facet], SearchError> {
        if !self.state.aggregations {
            return Err(SearchError::FacetsDisabled);
        }
        Ok(&self.ensure_loaded()?.facets)
    }

    /// Sort-value tuple of the final hit, for cursor pagination.
    ///
    /// `None` once a page comes back empty: the cursor is exhausted.
    pub fn last_sort_value(&mut self) -> Result<Option<Vec<Value>>, SearchError> {
        Ok(self.ensure_loaded()?.last_sort.clone())
    }
}
