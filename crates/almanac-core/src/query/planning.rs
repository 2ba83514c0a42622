//! Planning-item queries.

use serde_json::{Value, json};

use super::clause::{
    self, BoolQuery, CoverageRelation, Horizon, field_exists, nested, range, range_from_today,
    term, terms,
};
use super::{QueryContext, QueryPlan, SearchQuery, SearchRequest};
use crate::models::SpikeState;
use crate::params::{AdvancedSearch, EventIds, PlanningSearch};

const COVERAGE_SCHEDULE_PATH: &str = "_coverages";
const COVERAGE_SCHEDULE_FIELD: &str = "_coverages.scheduled";

/// Builds the query for one page of planning items.
///
/// Returns [`QueryPlan::MustChunk`] when the event ID list is longer than the
/// context's chunk size; the caller is then expected to split the list and
/// build one query per slice.
pub fn build(search: &PlanningSearch, context: &QueryContext) -> QueryPlan {
    let mut query = BoolQuery::default();

    let sort = match &search.event_ids {
        Some(EventIds::Many(ids)) if ids.len() > context.chunk_size => {
            return QueryPlan::MustChunk;
        }
        Some(event_ids) => {
            query.must.push(match event_ids {
                EventIds::One(id) => term("event_item", id.as_str()),
                EventIds::Many(ids) => terms("event_item", ids),
            });
            vec![json!({ "_planning_date": { "order": "asc" } })]
        }
        None => {
            push_filters(&mut query, search, context);
            vec![coverage_schedule_sort(search.only_future, context)]
        }
    };

    QueryPlan::Search(SearchRequest {
        source: SearchQuery::new(query.into_value(), sort),
        page: Some(search.page),
        max_results: Some(search.max_results),
    })
}

fn push_filters(query: &mut BoolQuery, search: &PlanningSearch, context: &QueryContext) {
    match &search.agendas {
        Some(agendas) => query.must.push(terms("agendas", agendas)),
        None if search.no_agenda_assigned => query.must_not.push(field_exists("agendas")),
        None => {}
    }

    clause::push_spike_state(query, search.state);

    if let Some(fulltext) = &search.fulltext {
        clause::push_fulltext(query, fulltext, CoverageRelation::Child);
    }

    let window = horizon(search.only_future);
    query.must.push(nested(
        COVERAGE_SCHEDULE_PATH,
        vec![range(
            COVERAGE_SCHEDULE_FIELD,
            range_from_today(window, &context.time_zone_offset),
        )],
    ));

    clause::push_advanced(
        query,
        &search.advanced_search,
        Some(CoverageRelation::Child),
    );
}

fn horizon(only_future: bool) -> Horizon {
    if only_future {
        Horizon::Future
    } else {
        Horizon::Past
    }
}

fn coverage_schedule_sort(only_future: bool, context: &QueryContext) -> Value {
    let order = if only_future { "asc" } else { "desc" };
    json!({
        COVERAGE_SCHEDULE_FIELD: {
            "order": order,
            "nested_path": COVERAGE_SCHEDULE_PATH,
            "nested_filter": range(
                COVERAGE_SCHEDULE_FIELD,
                range_from_today(horizon(only_future), &context.time_zone_offset),
            ),
        }
    })
}

/// Criteria selecting ad-hoc planning items (not linked to an event) for the
/// combined view, where coverages are indexed as nested documents.
pub fn adhoc_criteria(
    fulltext: Option<&str>,
    spike_state: SpikeState,
    advanced: &AdvancedSearch,
) -> BoolQuery {
    let mut query = BoolQuery::default();
    query.must_not.push(field_exists("event_item"));
    clause::push_spike_state(&mut query, Some(spike_state));
    if let Some(fulltext) = fulltext {
        clause::push_fulltext(&mut query, fulltext, CoverageRelation::Nested);
    }
    clause::push_advanced(&mut query, advanced, Some(CoverageRelation::Nested));
    query
}
