mod common;

use std::time::Duration;

use almanac_core::{
    ActiveFilter, CombinedSearch, MockBackend, PlanningError, RefetchOutcome,
    backend::{MockCall, SearchEndpoint},
    models::{Coverage, Record},
};
use common::{build_planner, create_test_planner, event, linked_planning, planning, ts};
use jiff::civil::date;

fn search_count(backend: &MockBackend, endpoint: SearchEndpoint) -> usize {
    backend
        .searches()
        .iter()
        .filter(|(called, _)| *called == endpoint)
        .count()
}

#[tokio::test]
async fn test_list_survives_restart() {
    let records: Vec<Record> = (1..=6)
        .map(|day| event(&format!("e{day}"), &format!("2024-01-0{day}T09:00:00Z")))
        .collect();
    let (temp_dir, planner, backend) =
        create_test_planner(MockBackend::new().with_records(records)).await;

    planner
        .search(CombinedSearch {
            max_results: 2,
            ..Default::default()
        })
        .await
        .expect("search should succeed");
    planner.load_more().await.expect("load more should succeed");
    let before = planner.list_state();
    drop(planner);

    let reopened = build_planner(temp_dir.path(), backend.clone()).await;
    assert_eq!(reopened.list_state(), before);

    let groups = reopened.load_more().await.expect("load more should succeed");
    assert_eq!(groups.len(), 6);
    assert_eq!(
        backend.searches().last().map(|(_, request)| request.source.from),
        Some(Some(4))
    );
}

#[tokio::test]
async fn test_linked_events_are_fetched_once_in_chunks() {
    let backend = MockBackend::new().with_records([
        linked_planning("p1", "e1", "2023-01-01T10:00:00Z"),
        linked_planning("p2", "e2", "2023-01-02T10:00:00Z"),
        linked_planning("p3", "e3", "2023-01-03T10:00:00Z"),
        event("e1", "2023-01-01T09:00:00Z"),
        event("e2", "2023-01-02T09:00:00Z"),
        event("e3", "2023-01-03T09:00:00Z"),
    ]);
    let (_temp_dir, planner, backend) = create_test_planner(backend).await;

    let groups = planner
        .search_planning(planner.planning_search())
        .await
        .expect("search should succeed");
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].date, date(2023, 1, 1));
    assert_eq!(search_count(&backend, SearchEndpoint::Events), 2);

    planner
        .search_planning(planner.planning_search())
        .await
        .expect("search should succeed");
    assert_eq!(search_count(&backend, SearchEndpoint::Events), 2);
}

#[tokio::test]
async fn test_load_planning_by_event_ids_in_batches() {
    let records: Vec<Record> = (1..=5)
        .map(|i| linked_planning(&format!("p{i}"), &format!("e{i}"), "2024-01-01T10:00:00Z"))
        .collect();
    let (_temp_dir, planner, backend) =
        create_test_planner(MockBackend::new().with_records(records)).await;

    let event_ids: Vec<String> = ["e1", "e2", "e3", "e4", "e5", "e-unknown"]
        .iter()
        .map(|id| id.to_string())
        .collect();
    let items = planner
        .load_planning_by_event_ids(event_ids)
        .await
        .expect("lookup should succeed");

    assert_eq!(search_count(&backend, SearchEndpoint::Planning), 3);
    let ids: Vec<&str> = items.iter().filter_map(|item| item.id.as_deref()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3", "p4", "p5"]);

    let none = planner
        .load_planning_by_event_ids(Vec::new())
        .await
        .expect("empty lookup should succeed");
    assert!(none.is_empty());
    assert_eq!(search_count(&backend, SearchEndpoint::Planning), 3);
}

#[tokio::test]
async fn test_save_moves_item_to_its_new_day() {
    let original = planning("p1", "2024-01-01T10:00:00Z");
    let (_temp_dir, planner, backend) = create_test_planner(
        MockBackend::new().with_records([Record::Planning(original.clone())]),
    )
    .await;
    planner
        .search_planning(planner.planning_search())
        .await
        .expect("search should succeed");

    let mut edited = original;
    edited.coverages[0].planning.scheduled = Some(ts("2024-01-05T10:00:00Z"));
    let saved = planner
        .save_planning(edited, None)
        .await
        .expect("save should succeed");

    // The original came from the cache filled by the search
    assert!(!backend
        .calls()
        .iter()
        .any(|call| matches!(call, MockCall::GetPlanning(_))));
    assert_eq!(
        saved.coverages[0].planning.scheduled,
        Some(ts("2024-01-05T10:00:00Z"))
    );

    let state = planner.list_state();
    assert_eq!(state.groups.len(), 1);
    assert_eq!(state.groups[0].date, date(2024, 1, 5));
    assert_eq!(state.record_count(), 1);
}

#[tokio::test]
async fn test_failed_reconciliation_leaves_item_untouched() {
    let original = planning("p1", "2024-01-01T10:00:00Z");
    let backend = MockBackend::new()
        .with_records([Record::Planning(original.clone())])
        .with_failing_coverage("photo")
        .with_coverage_latency(Duration::from_millis(10));
    let (_temp_dir, planner, backend) = create_test_planner(backend).await;

    let mut edited = original.clone();
    edited.slugline = Some("renamed".to_string());
    let mut photo = Coverage::scheduled_at(ts("2024-01-02T10:00:00Z"));
    photo.planning.slugline = Some("photo".to_string());
    edited.coverages.push(photo);
    edited.coverages.push(Coverage::scheduled_at(ts("2024-01-03T10:00:00Z")));

    let err = planner
        .save_planning(edited, Some(original))
        .await
        .expect_err("save should fail");
    assert!(err.is_reconciliation());
    assert!(matches!(
        err,
        PlanningError::Reconciliation {
            failed: 1,
            total: 2,
            ..
        }
    ));

    let stored = backend.stored_planning("p1").expect("item still stored");
    assert_eq!(stored.slugline.as_deref(), Some("p1-slug"));
    assert!(!backend
        .calls()
        .iter()
        .any(|call| matches!(call, MockCall::SavePlanning { .. })));
}

#[tokio::test]
async fn test_refetch_rebuilds_list_and_respects_filter_switch() {
    let records: Vec<Record> = (1..=4)
        .map(|day| event(&format!("e{day}"), &format!("2024-02-0{day}T09:00:00Z")))
        .collect();
    let (_temp_dir, planner, _backend) =
        create_test_planner(MockBackend::new().with_records(records)).await;

    planner
        .search(CombinedSearch {
            max_results: 2,
            ..Default::default()
        })
        .await
        .expect("search should succeed");
    planner.load_more().await.expect("load more should succeed");

    let outcome = planner.refetch().await.expect("refetch should succeed");
    assert!(!outcome.is_aborted());
    assert_eq!(outcome.into_groups().len(), 4);

    planner
        .set_active_filter(ActiveFilter::Planning)
        .await
        .expect("filter switch should succeed");
    let outcome = planner.refetch().await.expect("refetch should resolve");
    assert_eq!(outcome, RefetchOutcome::Aborted);
    assert_eq!(planner.list_state().record_count(), 4);
}

#[tokio::test]
async fn test_backend_errors_propagate() {
    let backend = MockBackend::new().with_search_error(PlanningError::Backend {
        status: Some(500),
        message: "index unavailable".to_string(),
    });
    let (_temp_dir, planner, _backend) = create_test_planner(backend).await;

    let err = planner
        .search(CombinedSearch::default())
        .await
        .expect_err("search should fail");
    assert_eq!(err.status(), Some(500));
    assert_eq!(planner.list_state().last_request, None);

    assert!(matches!(
        planner.fetch_planning_by_id("missing", true).await,
        Err(PlanningError::NotFound { .. })
    ));
}
