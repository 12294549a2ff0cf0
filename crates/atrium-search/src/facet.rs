//! Facet value objects.
//!
//! A [`Facet`] is one facetable field with its discrete value buckets; a
//! [`FacetTerm`] is one bucket. Terms know how to render themselves as
//! `field:value` filter-query strings and how to toggle that string inside a
//! caller-supplied parameter set. The toggle helpers are pure: they return
//! new parameter maps and never mutate their input.

use std::collections::BTreeMap;

use atrium_engine::AggregationBucket;
use atrium_profile::ProfileElement;
use serde_json::Value;

/// Multi-valued request parameters, as received from the web layer.
///
/// Treated as external, already-validated input; the core only reads and
/// rewrites the `fq` entry.
pub type ParamMap = BTreeMap<String, Vec<String>>;

/// The filter-query parameter key.
pub const FQ_PARAM: &str = "fq";

/// One facetable field and its term buckets, in engine bucket order.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    /// Display label, from the profile element.
    pub name: String,
    /// Engine field the aggregation ran over (keyword variant).
    pub field: String,
    /// Term buckets in response order.
    pub terms: Vec<FacetTerm>,
}

impl Facet {
    /// Builds a facet from a profile element and its aggregation buckets.
    ///
    /// Bucket order is preserved; an element whose aggregation came back
    /// empty yields a facet with no terms.
    pub fn from_buckets(element: &ProfileElement, buckets: &[AggregationBucket]) -> Self {
        let field = element.keyword_field();
        let terms = buckets
            .iter()
            .map(|bucket| FacetTerm::from_bucket(&field, bucket))
            .collect();

        Self {
            name: element.label.clone(),
            field,
            terms,
        }
    }
}

/// One discrete value bucket of a facet.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetTerm {
    /// The raw field value.
    pub name: String,
    /// Display label (the value itself, untransformed).
    pub label: String,
    /// Number of matching documents carrying this value.
    pub count: u64,
    /// Engine field of the owning facet.
    pub field: String,
}

impl FacetTerm {
    /// Builds a term from an aggregation bucket.
    fn from_bucket(field: &str, bucket: &AggregationBucket) -> Self {
        let name = match &bucket.key {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };

        Self {
            label: name.clone(),
            name,
            count: bucket.doc_count,
            field: field.to_string(),
        }
    }

    /// Canonical `field:value` filter-query representation of this term.
    pub fn query_value(&self) -> String {
        format!("{}:{}", self.field, self.name)
    }

    /// Returns true if the given parameters already select this term.
    pub fn selected_in(&self, params: &ParamMap) -> bool {
        params
            .get(FQ_PARAM)
            .is_some_and(|values| values.iter().any(|v| v == &self.query_value()))
    }

    /// Returns a copy of `params` with this term's filter query added.
    ///
    /// Adding an already-present term is a no-op copy.
    #[must_use]
    pub fn added_to_params(&self, params: &ParamMap) -> ParamMap {
        let mut next = params.clone();
        let values = next.entry(FQ_PARAM.to_string()).or_default();
        let query_value = self.query_value();
        if !values.contains(&query_value) {
            values.push(query_value);
        }
        next
    }

    /// Returns a copy of `params` with this term's filter query removed.
    ///
    /// The `fq` entry is dropped entirely when it becomes empty.
    #[must_use]
    pub fn removed_from_params(&self, params: &ParamMap) -> ParamMap {
        let mut next = params.clone();
        if let Some(values) = next.get_mut(FQ_PARAM) {
            let query_value = self.query_value();
            values.retain(|v| v != &query_value);
            if values.is_empty() {
                next.remove(FQ_PARAM);
            }
        }
        next
    }
}
