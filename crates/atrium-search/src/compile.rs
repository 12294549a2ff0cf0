//! Query compiler.
//!
//! Compiles a relation state into the engine's boolean/filter/aggregation
//! JSON DSL. Compilation is a pure function of the state: the same state
//! always renders byte-identical JSON, and nothing here touches the network.
//!
//! The compiled shape is one boolean query whose `must` holds the scored
//! clauses and whose `filter.bool` holds the unscored constraints, plus
//! optional `aggregations`, `sort` and pagination keys.

use atrium_profile::{DEFAULT_WEIGHT, FULL_TEXT_FIELD, MetadataProfile};
use serde_json::{Map, Value, json};

use crate::{
    CompileError, TermInput,
    relation::{FilterValue, QueryFields, RangeOp, RelationState, SCORE_FIELD, SortMode},
};

/// Engine field discriminating the owning entity type.
pub const CLASS_FIELD: &str = "class";

/// Compiles a relation state into the engine query DSL.
pub(crate) fn compile(state: &RelationState, entity_type: &str) -> Result<Value, CompileError> {
    let mut body = Map::new();
    body.insert("query".to_string(), query_clause(state, entity_type)?);

    if let Some(aggregations) = aggregation_clause(state) {
        body.insert("aggregations".to_string(), aggregations);
    }

    if let Some(sort) = sort_clause(state) {
        body.insert("sort".to_string(), sort);
    }

    paginate(state, &mut body)?;

    Ok(Value::Object(body))
}

/// Builds the boolean query: scored `must` clauses plus the filter context.
fn query_clause(state: &RelationState, entity_type: &str) -> Result<Value, CompileError> {
    let mut bool_body = Map::new();

    let scored = scored_clauses(state)?;
    if !scored.is_empty() {
        bool_body.insert("must".to_string(), Value::Array(scored));
    }

    let mut filter_bool = Map::new();
    filter_bool.insert(
        "must".to_string(),
        Value::Array(filter_clauses(state, entity_type)),
    );

    let must_not = must_not_clauses(state);
    if !must_not.is_empty() {
        filter_bool.insert("must_not".to_string(), Value::Array(must_not));
    }

    bool_body.insert("filter".to_string(), json!({ "bool": filter_bool }));

    Ok(json!({ "bool": bool_body }))
}

/// Builds the scored clauses.
///
/// Per-field multi queries and the single weighted query are mutually
/// exclusive: when any multi query is present, the weighted query is not
/// compiled. Multi queries carry no field weighting; only the single query
/// does.
fn scored_clauses(state: &RelationState) -> Result<Vec<Value>, CompileError> {
    if !state.multi_queries.is_empty() {
        return state
            .multi_queries
            .iter()
            .map(|(field, term)| match term {
                TermInput::Text(text) => Ok(json!({ "match": { (field.as_str()): text } })),
                TermInput::Date(date) => {
                    Ok(json!({ "range": { (field.as_str()): date.to_range_body()? } }))
                }
            })
            .collect();
    }

    let Some((fields, term)) = &state.query else {
        return Ok(Vec::new());
    };

    match term {
        TermInput::Text(text) => {
            let mut clause = Map::new();
            clause.insert("query".to_string(), json!(text));
            if let Some(field_list) = resolve_query_fields(fields, state.profile.as_ref()) {
                clause.insert("fields".to_string(), json!(field_list));
            }
            clause.insert("default_operator".to_string(), json!("and"));
            clause.insert("lenient".to_string(), json!(true));
            Ok(vec![json!({ "simple_query_string": clause })])
        }
        TermInput::Date(date) => {
            let Some(field_list) = resolve_query_fields(fields, state.profile.as_ref()) else {
                return Err(CompileError::InvalidDate(
                    "a date term requires named query fields".to_string(),
                ));
            };
            let body = date.to_range_body()?;
            let ranges: Vec<Value> = field_list
                .iter()
                .map(|field| json!({ "range": { (strip_weight(field)): body.clone() } }))
                .collect();
            match ranges.len() {
                1 => Ok(ranges),
                _ => Ok(vec![json!({
                    "bool": { "should": ranges, "minimum_should_match": 1 }
                })]),
            }
        }
    }
}

/// Resolves the field list of the single query.
///
/// `None` means no field restriction (search all fields).
fn resolve_query_fields(
    fields: &QueryFields,
    profile: Option<&MetadataProfile>,
) -> Option<Vec<String>> {
    match fields {
        QueryFields::Explicit(list) => Some(list.clone()),
        QueryFields::Searchable => Some(match profile {
            Some(profile) => profile.weighted_query_fields(),
            None => vec![format!("{FULL_TEXT_FIELD}^{DEFAULT_WEIGHT}")],
        }),
        QueryFields::All => None,
    }
}

/// Strips a `^weight` suffix from a field name.
fn strip_weight(field: &str) -> &str {
    field.split_once('^').map_or(field, |(name, _)| name)
}

/// Builds the filter-context `must` clauses.
///
/// The class discriminator term always comes first, scoping results to the
/// owning entity type.
fn filter_clauses(state: &RelationState, entity_type: &str) -> Vec<Value> {
    let mut clauses = vec![json!({ "term": { CLASS_FIELD: entity_type } })];
    clauses.extend(state.filters.iter().map(filter_entry));
    clauses.extend(state.filter_ranges.iter().map(range_entry));
    clauses
}

/// Builds the filter-context `must_not` clauses.
fn must_not_clauses(state: &RelationState) -> Vec<Value> {
    let mut clauses: Vec<Value> = state.must_not_filters.iter().map(filter_entry).collect();
    clauses.extend(state.must_not_ranges.iter().map(range_entry));
    clauses
}

/// Renders one filter entry as a `term` or `terms` clause.
fn filter_entry((field, value): &(String, FilterValue)) -> Value {
    match value {
        FilterValue::One(value) => json!({ "term": { (field.as_str()): value } }),
        FilterValue::Many(values) => json!({ "terms": { (field.as_str()): values } }),
    }
}

/// Renders one range entry.
fn range_entry((field, op, value): &(String, RangeOp, Value)) -> Value {
    json!({ "range": { (field.as_str()): { (op.as_str()): value } } })
}

/// Builds the aggregations block: one terms aggregation per facetable
/// element of the active profile, in profile order, keyed by the keyword
/// field.
fn aggregation_clause(state: &RelationState) -> Option<Value> {
    if !state.aggregations {
        return None;
    }
    let profile = state.profile.as_ref()?;

    let mut aggregations = Map::new();
    for element in profile.facetable_elements() {
        let field = element.keyword_field();
        aggregations.insert(
            field.clone(),
            json!({ "terms": { "field": field, "size": state.bucket_limit } }),
        );
    }

    if aggregations.is_empty() {
        return None;
    }
    Some(Value::Object(aggregations))
}

/// Builds the sort block.
///
/// Every explicit order carries `unmapped_type` so sorting does not
/// hard-fail on documents missing the field; the score pseudo-field never
/// does. Disabled sorting renders the engine's index-order sentinel.
fn sort_clause(state: &RelationState) -> Option<Value> {
    match &state.sort {
        SortMode::Relevance => None,
        SortMode::Unsorted => Some(json!(["_doc"])),
        SortMode::Fields(orders) if orders.is_empty() => None,
        SortMode::Fields(orders) => {
            let entries: Vec<Value> = orders
                .iter()
                .map(|(field, direction)| {
                    if field == SCORE_FIELD {
                        json!({ SCORE_FIELD: { "order": direction.as_str() } })
                    } else {
                        json!({
                            (field.as_str()): {
                                "order": direction.as_str(),
                                "unmapped_type": "keyword",
                            }
                        })
                    }
                })
                .collect();
            Some(Value::Array(entries))
        }
    }
}

/// Writes the pagination keys: `search_after` takes precedence over
/// `from`, and the two are mutually exclusive.
fn paginate(state: &RelationState, body: &mut Map<String, Value>) -> Result<(), CompileError> {
    if state.search_after.is_some() && state.start.is_some() {
        return Err(CompileError::ConflictingPagination);
    }

    if let Some(sort_values) = &state.search_after {
        body.insert("search_after".to_string(), json!(sort_values));
    } else if let Some(start) = state.start {
        body.insert("from".to_string(), json!(start));
    }

    if let Some(limit) = state.limit {
        body.insert("size".to_string(), json!(limit));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use atrium_profile::{MetadataProfile, ProfileElement};

    use super::*;
    use crate::{
        DateInput, PartialDate,
        relation::{RangeOp, SortDirection},
    };

    fn profile() -> MetadataProfile {
        MetadataProfile::new("default")
            .element(ProfileElement::new("title").weight(10.0))
            .element(ProfileElement::new("subject").label("Subject").facetable())
            .element(ProfileElement::new("resource_type").label("Type").facetable())
    }

    fn compile_state(state: &RelationState) -> Value {
        compile(state, "item").unwrap()
    }

    #[test]
    fn empty_state_compiles_class_scope_only() {
        let compiled = compile_state(&RelationState::default());
        assert_eq!(
            compiled["query"]["bool"]["filter"]["bool"]["must"],
            json!([{ "term": { "class": "item" } }])
        );
        assert!(compiled["query"]["bool"].get("must").is_none());
        assert!(compiled.get("sort").is_none());
        assert!(compiled.get("aggregations").is_none());
        assert!(compiled.get("from").is_none());
    }

    #[test]
    fn compilation_is_deterministic() {
        let mut state = RelationState::default();
        state
            .filters
            .push(("collection_id".to_string(), FilterValue::One(json!(42))));
        state.query = Some((QueryFields::Searchable, TermInput::from("bridge design")));
        state.profile = Some(profile());
        state.aggregations = true;

        let first = serde_json::to_string(&compile_state(&state)).unwrap();
        let second = serde_json::to_string(&compile_state(&state)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn scalar_and_set_filters_render_term_and_terms() {
        let mut state = RelationState::default();
        state
            .filters
            .push(("unit_id".to_string(), FilterValue::One(json!(7))));
        state.filters.push((
            "status".to_string(),
            FilterValue::Many(vec![json!("open"), json!("embargoed")]),
        ));

        let must = &compile_state(&state)["query"]["bool"]["filter"]["bool"]["must"];
        assert_eq!(must[1], json!({ "term": { "unit_id": 7 } }));
        assert_eq!(
            must[2],
            json!({ "terms": { "status": ["open", "embargoed"] } })
        );
    }

    #[test]
    fn repeated_filters_on_one_field_are_independent_entries() {
        let mut state = RelationState::default();
        state
            .filters
            .push(("subject".to_string(), FilterValue::One(json!("bridges"))));
        state
            .filters
            .push(("subject".to_string(), FilterValue::One(json!("steel"))));

        let must = &compile_state(&state)["query"]["bool"]["filter"]["bool"]["must"];
        assert_eq!(must.as_array().unwrap().len(), 3);
    }

    #[test]
    fn ranges_and_exclusions_compile_into_filter_context() {
        let mut state = RelationState::default();
        state
            .filter_ranges
            .push(("created_at".to_string(), RangeOp::Gte, json!("2020-01-01")));
        state
            .must_not_filters
            .push(("stage".to_string(), FilterValue::One(json!("withdrawn"))));
        state
            .must_not_ranges
            .push(("embargo_until".to_string(), RangeOp::Gt, json!("2026-01-01")));

        let filter = &compile_state(&state)["query"]["bool"]["filter"]["bool"];
        assert_eq!(
            filter["must"][1],
            json!({ "range": { "created_at": { "gte": "2020-01-01" } } })
        );
        assert_eq!(
            filter["must_not"],
            json!([
                { "term": { "stage": "withdrawn" } },
                { "range": { "embargo_until": { "gt": "2026-01-01" } } },
            ])
        );
    }

    #[test]
    fn weighted_query_compiles_simple_query_string() {
        let mut state = RelationState::default();
        state.profile = Some(profile());
        state.query = Some((QueryFields::Searchable, TermInput::from("bridge design")));

        let must = &compile_state(&state)["query"]["bool"]["must"];
        assert_eq!(
            must[0],
            json!({
                "simple_query_string": {
                    "default_operator": "and",
                    "fields": ["title^10", "subject^1", "resource_type^1", "full_text^1"],
                    "lenient": true,
                    "query": "bridge design",
                }
            })
        );
    }

    #[test]
    fn query_all_omits_field_restriction() {
        let mut state = RelationState::default();
        state.query = Some((QueryFields::All, TermInput::from("bridge")));

        let clause = &compile_state(&state)["query"]["bool"]["must"][0]["simple_query_string"];
        assert!(clause.get("fields").is_none());
        assert_eq!(clause["query"], json!("bridge"));
    }

    #[test]
    fn date_query_compiles_half_open_range() {
        let mut state = RelationState::default();
        state.query = Some((
            QueryFields::Explicit(vec!["date_issued^2".to_string()]),
            TermInput::Date(DateInput::Single(PartialDate::month(1999, 6))),
        ));

        let must = &compile_state(&state)["query"]["bool"]["must"];
        assert_eq!(
            must[0],
            json!({ "range": { "date_issued": { "gte": "1999-06-01", "lt": "1999-07-01" } } })
        );
    }

    #[test]
    fn multi_queries_preempt_the_weighted_query() {
        let mut state = RelationState::default();
        state
            .multi_queries
            .push(("title".to_string(), TermInput::from("viaduct")));
        state.query = Some((QueryFields::All, TermInput::from("ignored")));

        let must = &compile_state(&state)["query"]["bool"]["must"];
        assert_eq!(must, &json!([{ "match": { "title": "viaduct" } }]));
    }

    #[test]
    fn multi_query_carries_no_field_weights() {
        // Deliberate asymmetry: only the single query ever sees the weighted
        // field list; per-field advanced search compiles plain match clauses.
        let mut state = RelationState::default();
        state.profile = Some(profile());
        state
            .multi_queries
            .push(("title".to_string(), TermInput::from("viaduct")));

        let rendered = serde_json::to_string(&compile_state(&state)).unwrap();
        assert!(!rendered.contains('^'));
    }

    #[test]
    fn multi_query_date_term_compiles_range() {
        let mut state = RelationState::default();
        state.multi_queries.push((
            "date_issued".to_string(),
            TermInput::Date(DateInput::Single(PartialDate::year(1999))),
        ));

        let must = &compile_state(&state)["query"]["bool"]["must"];
        assert_eq!(
            must[0],
            json!({ "range": { "date_issued": { "gte": "1999-01-01", "lt": "2000-01-01" } } })
        );
    }

    #[test]
    fn aggregations_follow_profile_order_and_bucket_limit() {
        let mut state = RelationState::default();
        state.profile = Some(profile());
        state.aggregations = true;
        state.bucket_limit = 5;

        let aggregations = &compile_state(&state)["aggregations"];
        assert_eq!(
            aggregations["subject.keyword"],
            json!({ "terms": { "field": "subject.keyword", "size": 5 } })
        );
        assert_eq!(
            aggregations["resource_type.keyword"],
            json!({ "terms": { "field": "resource_type.keyword", "size": 5 } })
        );
    }

    #[test]
    fn aggregations_disabled_compiles_no_block() {
        let mut state = RelationState::default();
        state.profile = Some(profile());

        assert!(compile_state(&state).get("aggregations").is_none());
    }

    #[test]
    fn sort_adds_unmapped_type_except_for_score() {
        let mut state = RelationState::default();
        state.sort = SortMode::Fields(vec![
            ("date_issued".to_string(), SortDirection::Desc),
            (SCORE_FIELD.to_string(), SortDirection::Desc),
        ]);

        let sort = &compile_state(&state)["sort"];
        assert_eq!(
            sort[0],
            json!({ "date_issued": { "order": "desc", "unmapped_type": "keyword" } })
        );
        assert_eq!(sort[1], json!({ "_score": { "order": "desc" } }));
    }

    #[test]
    fn unsorted_emits_index_order() {
        let mut state = RelationState::default();
        state.sort = SortMode::Unsorted;
        assert_eq!(compile_state(&state)["sort"], json!(["_doc"]));
    }

    #[test]
    fn offset_pagination_renders_from_and_size() {
        let mut state = RelationState::default();
        state.start = Some(20);
        state.limit = Some(10);

        let compiled = compile_state(&state);
        assert_eq!(compiled["from"], json!(20));
        assert_eq!(compiled["size"], json!(10));
        assert!(compiled.get("search_after").is_none());
    }

    #[test]
    fn cursor_pagination_renders_search_after_and_size() {
        let mut state = RelationState::default();
        state.limit = Some(100);
        state.search_after = Some(vec![json!(1.5), json!("item:42")]);

        let compiled = compile_state(&state);
        assert_eq!(compiled["search_after"], json!([1.5, "item:42"]));
        assert_eq!(compiled["size"], json!(100));
        assert!(compiled.get("from").is_none());
    }

    #[test]
    fn both_pagination_modes_is_a_compile_error() {
        let mut state = RelationState::default();
        state.start = Some(0);
        state.search_after = Some(vec![json!(1)]);

        assert_eq!(
            compile(&state, "item").unwrap_err(),
            CompileError::ConflictingPagination
        );
    }
}
