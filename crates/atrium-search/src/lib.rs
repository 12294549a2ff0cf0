//! Query builder, compiler and result materialization for atrium.
//!
//! The search core of the repository. A [`Relation`] captures filters,
//! weighted free-text queries, ranges, sort orders, scopes and pagination
//! for one searchable entity type; on first result access it compiles to the
//! engine's JSON DSL, executes through the injected gateway, and hydrates
//! entities from the primary datastore in engine order. [`Facet`] and
//! [`FacetTerm`] wrap the aggregation buckets of a response.
//!
//! # Execution model
//!
//! Building and compiling are synchronous and side-effect-free apart from
//! the relation's own state. Materialization performs exactly one engine
//! round trip and one datastore batch lookup per state generation; results
//! are memoized until the next builder mutation. There is no caching across
//! requests.

#![warn(missing_docs)]

mod compile;
mod error;
mod facet;
mod relation;
mod result;
mod term;

pub use compile::CLASS_FIELD;
pub use error::{CompileError, SearchError};
pub use facet::{FQ_PARAM, Facet, FacetTerm, ParamMap};
pub use relation::{
    DEFAULT_BUCKET_LIMIT, FilterValue, RangeOp, Relation, SCORE_FIELD, SortDirection,
};
pub use term::{DateInput, PartialDate, TermInput};
