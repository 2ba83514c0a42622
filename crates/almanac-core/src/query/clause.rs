//! Clause constructors for the backend's boolean query syntax.

use serde_json::{Value, json};

use crate::models::SpikeState;
use crate::params::AdvancedSearch;

/// Accumulates `must` / `must_not` / `should` clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Value>,
    pub must_not: Vec<Value>,
    pub should: Vec<Value>,
}

impl BoolQuery {
    pub fn into_value(self) -> Value {
        let mut inner = serde_json::Map::new();
        inner.insert("must".to_string(), Value::Array(self.must));
        inner.insert("must_not".to_string(), Value::Array(self.must_not));
        if !self.should.is_empty() {
            inner.insert("should".to_string(), Value::Array(self.should));
        }
        json!({ "bool": inner })
    }
}

/// Which side of "start of today" a range clause selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    /// Scheduled today or later
    Future,
    /// Scheduled before today
    Past,
}

/// How coverage documents relate to their planning item in an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageRelation {
    /// Coverages indexed as child documents of type `coverage`
    Child,
    /// Coverages indexed as a nested `coverages` field
    Nested,
}

pub fn term(field: &str, value: impl Into<Value>) -> Value {
    json!({ "term": { field: value.into() } })
}

pub fn terms<S: AsRef<str>>(field: &str, values: &[S]) -> Value {
    let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
    json!({ "terms": { field: values } })
}

/// Matches documents where `field` has any value; meant for `must_not`.
pub fn field_exists(field: &str) -> Value {
    json!({ "constant_score": { "filter": { "exists": { "field": field } } } })
}

pub fn nested(path: &str, must: Vec<Value>) -> Value {
    json!({ "nested": { "path": path, "query": { "bool": { "must": must } } } })
}

/// Range body comparing against the start of today in the session zone.
pub fn range_from_today(horizon: Horizon, time_zone: &str) -> Value {
    match horizon {
        Horizon::Future => json!({ "gte": "now/d", "time_zone": time_zone }),
        Horizon::Past => json!({ "lt": "now/d", "time_zone": time_zone }),
    }
}

pub fn range(field: &str, body: Value) -> Value {
    json!({ "range": { field: body } })
}

/// Escapes characters the query-string syntax treats as operators and groups
/// the text so that it is matched as a whole.
pub fn escape_query_text(text: &str) -> String {
    format!("({})", text.replace('/', "\\/"))
}

pub fn query_string(text: &str) -> Value {
    json!({
        "query_string": {
            "query": escape_query_text(text),
            "lenient": false,
            "default_operator": "AND",
        }
    })
}

/// Query-string clause restricted to a single field.
pub fn field_query_string(field: &str, text: &str) -> Value {
    json!({
        "query_string": {
            "query": format!("{field}:{}", escape_query_text(text)),
            "default_operator": "AND",
        }
    })
}

/// Adds the clause for the given spike filter; `All` adds nothing.
pub fn push_spike_state(query: &mut BoolQuery, state: Option<SpikeState>) {
    match state.unwrap_or_default() {
        SpikeState::Spiked => query.must.push(term("state", "spiked")),
        SpikeState::Active => query.must_not.push(term("state", "spiked")),
        SpikeState::All => {}
    }
}

/// Adds a fulltext disjunction that also matches when only one of the
/// item's coverages contains the text.
pub fn push_fulltext(query: &mut BoolQuery, fulltext: &str, relation: CoverageRelation) {
    let direct = query_string(fulltext);
    let via_coverage = match relation {
        CoverageRelation::Child => json!({
            "has_child": {
                "type": "coverage",
                "query": { "bool": { "must": [direct.clone()] } },
            }
        }),
        CoverageRelation::Nested => nested("coverages", vec![direct.clone()]),
    };
    query
        .must
        .push(json!({ "bool": { "should": [direct, via_coverage] } }));
}

/// Adds metadata criteria. Slugline matches on coverages too when the
/// index carries them.
pub fn push_advanced(
    query: &mut BoolQuery,
    advanced: &AdvancedSearch,
    coverages: Option<CoverageRelation>,
) {
    if !advanced.anpa_category.is_empty() {
        query
            .must
            .push(terms("anpa_category.qcode", &advanced.anpa_category));
    }
    if !advanced.subject.is_empty() {
        query.must.push(terms("subject.qcode", &advanced.subject));
    }
    if let Some(pubstatus) = &advanced.pubstatus {
        query.must.push(term("pubstatus", pubstatus.as_str()));
    }
    if let Some(slugline) = &advanced.slugline {
        let direct = field_query_string("slugline", slugline);
        let clause = match coverages {
            Some(CoverageRelation::Nested) => {
                let coverage = field_query_string("coverages.planning.slugline", slugline);
                json!({ "bool": { "should": [direct, nested("coverages", vec![coverage])] } })
            }
            Some(CoverageRelation::Child) => {
                let coverage = field_query_string("planning.slugline", slugline);
                json!({
                    "bool": {
                        "should": [
                            direct,
                            {
                                "has_child": {
                                    "type": "coverage",
                                    "query": { "bool": { "must": [coverage] } },
                                }
                            },
                        ]
                    }
                })
            }
            None => direct,
        };
        query.must.push(clause);
    }
}
