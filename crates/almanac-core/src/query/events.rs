//! Event queries.

use serde_json::json;

use super::clause::{self, BoolQuery, terms};
use super::{SearchQuery, SearchRequest};
use crate::models::SpikeState;
use crate::params::AdvancedSearch;

/// Criteria selecting events for the combined view.
pub fn criteria(
    fulltext: Option<&str>,
    spike_state: SpikeState,
    advanced: &AdvancedSearch,
) -> BoolQuery {
    let mut query = BoolQuery::default();
    clause::push_spike_state(&mut query, Some(spike_state));
    if let Some(fulltext) = fulltext {
        query.must.push(clause::query_string(fulltext));
    }
    clause::push_advanced(&mut query, advanced, None);
    query
}

/// Looks up exactly the given events, in any state, oldest first.
///
/// The caller keeps `ids` within the chunk size; see [`crate::fetch`].
pub fn by_ids<S: AsRef<str>>(ids: &[S]) -> SearchRequest {
    let mut query = BoolQuery::default();
    query.must.push(terms("_id", ids));
    SearchRequest {
        source: SearchQuery::new(
            query.into_value(),
            vec![json!({ "dates.start": { "order": "asc" } })],
        ),
        page: Some(1),
        max_results: u32::try_from(ids.len()).ok(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::query::clause::term;

    #[test]
    fn test_by_ids_requests_every_id_on_one_page() {
        let request = by_ids(&["e1", "e2"]);
        assert_eq!(
            request.source.query,
            json!({ "bool": { "must": [{ "terms": { "_id": ["e1", "e2"] } }], "must_not": [] } })
        );
        assert_eq!(request.max_results, Some(2));
    }

    #[test]
    fn test_criteria_uses_plain_fulltext() {
        let criteria = criteria(Some("storm"), SpikeState::Active, &AdvancedSearch::default());
        assert_eq!(criteria.must, vec![clause::query_string("storm")]);
        assert_eq!(criteria.must_not, vec![term("state", "spiked")]);
    }
}
