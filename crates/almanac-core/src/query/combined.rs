//! The federated query behind the combined events-and-planning list.
//!
//! Both record types live in one search index; each hit carries its type in
//! `_type`. The filter is a disjunction of two typed branches so that events
//! and ad-hoc planning items are selected by their own criteria, and the
//! results are ordered by the shared `_planning_schedule` field.

use serde_json::{Value, json};

use super::clause::{BoolQuery, Horizon, range, range_from_today};
use super::{QueryContext, SearchQuery, SearchRequest, events, planning};
use crate::params::CombinedSearch;

const SCHEDULE_PATH: &str = "_planning_schedule";
const SCHEDULE_FIELD: &str = "_planning_schedule.scheduled";

pub fn build(search: &CombinedSearch, context: &QueryContext) -> SearchRequest {
    let fulltext = search.fulltext.as_deref();
    let advanced = &search.advanced_search;
    let events_criteria = events::criteria(fulltext, search.spike_state, advanced);
    let planning_criteria = planning::adhoc_criteria(fulltext, search.spike_state, advanced);

    let filter = json!({
        "or": {
            "filters": [
                typed_branch("events", events_criteria),
                typed_branch("planning", planning_criteria),
            ]
        }
    });

    let sort = vec![json!({
        SCHEDULE_FIELD: {
            "order": "asc",
            "nested_path": SCHEDULE_PATH,
            "nested_filter": range(
                SCHEDULE_FIELD,
                range_from_today(Horizon::Future, &context.time_zone_offset),
            ),
        }
    })];

    let page = search.page.max(1);
    let mut source = SearchQuery::new(BoolQuery::default().into_value(), sort);
    source.filter = Some(filter);
    source.size = Some(search.max_results);
    source.from = Some((page - 1).saturating_mul(search.max_results));

    SearchRequest {
        source,
        page: None,
        max_results: None,
    }
}

fn typed_branch(item_type: &str, criteria: BoolQuery) -> Value {
    json!({
        "and": {
            "filters": [
                { "type": { "value": item_type } },
                criteria.into_value(),
            ]
        }
    })
}
