//! Tests for the planner module.

use std::sync::Arc;
use std::time::Duration;

use jiff::tz::TimeZone;
use tempfile::TempDir;

use super::*;
use crate::backend::{Backend, MockBackend, MockCall, SearchEndpoint};
use crate::list::ActiveFilter;
use crate::list::refetch::RefetchOutcome;
use crate::models::{Agenda, Coverage, Planning, PlanningHistory, Record, WorkflowState};
use crate::params::{CombinedSearch, EventIds};
use crate::test_support::{event_on, planning_on, ts};

/// Helper function to create a test planner over a mock backend
async fn create_test_planner(
    backend: MockBackend,
    chunk_size: usize,
) -> (TempDir, Planner, Arc<MockBackend>) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let backend = Arc::new(backend);
    let planner = PlannerBuilder::new()
        .with_database_path(Some(&db_path))
        .with_backend(backend.clone())
        .with_chunk_size(chunk_size)
        .with_time_zone(TimeZone::UTC)
        .build()
        .await
        .expect("Failed to create planner");
    (temp_dir, planner, backend)
}

fn linked_planning(id: &str, event: &str) -> Record {
    let mut record = planning_on(id, "2024-01-01T10:00:00Z");
    if let Record::Planning(item) = &mut record {
        item.event_item = Some(event.to_string());
    }
    record
}

fn existing_item() -> Planning {
    Planning {
        id: Some("p1".to_string()),
        etag: Some("etag-0".to_string()),
        slugline: Some("budget".to_string()),
        coverages: vec![
            Coverage {
                id: Some("c1".to_string()),
                planning_item: Some("p1".to_string()),
                ..Coverage::scheduled_at(ts("2024-01-01T10:00:00Z"))
            },
            Coverage {
                id: Some("c2".to_string()),
                planning_item: Some("p1".to_string()),
                ..Coverage::scheduled_at(ts("2024-01-01T12:00:00Z"))
            },
        ],
        ..Default::default()
    }
}

fn existing_backend() -> MockBackend {
    MockBackend::new().with_records([Record::Planning(existing_item())])
}

#[tokio::test]
async fn test_build_requires_a_backend() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let result = PlannerBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .build()
        .await;
    assert!(matches!(result, Err(PlanningError::Configuration { .. })));
}

#[tokio::test]
async fn test_build_rejects_zero_chunk_size() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let result = PlannerBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_backend(Arc::new(MockBackend::new()))
        .with_chunk_size(0)
        .build()
        .await;
    assert!(matches!(result, Err(PlanningError::InvalidInput { .. })));
}

#[tokio::test]
async fn test_query_planning_chunks_long_event_lists() {
    let records: Vec<Record> = (0..7)
        .map(|i| linked_planning(&format!("p{i}"), &format!("e{i}")))
        .collect();
    let (_temp_dir, planner, backend) =
        create_test_planner(MockBackend::new().with_records(records), 3).await;

    let event_ids: Vec<String> = (0..7).map(|i| format!("e{i}")).collect();
    let found = planner
        .query_planning(&PlanningSearch::for_events(event_ids))
        .await
        .expect("query should succeed");

    let searches = backend.searches();
    assert_eq!(searches.len(), 3);
    let batch_sizes: Vec<usize> = searches
        .iter()
        .map(|(_, request)| request.source.query["bool"]["must"][0]["terms"]["event_item"]
            .as_array()
            .map_or(0, Vec::len))
        .collect();
    assert_eq!(batch_sizes, vec![3, 3, 1]);

    let ids: Vec<&str> = found.iter().filter_map(Record::id).collect();
    assert_eq!(ids, vec!["p0", "p1", "p2", "p3", "p4", "p5", "p6"]);
}

#[tokio::test]
async fn test_single_event_lookup_is_not_chunked() {
    let mock = MockBackend::new().with_records([linked_planning("p1", "e1")]);
    let (_temp_dir, planner, backend) = create_test_planner(mock, 3).await;

    let search = PlanningSearch {
        event_ids: Some(EventIds::One("e1".to_string())),
        ..Default::default()
    };
    let found = planner.query_planning(&search).await.expect("query should succeed");
    assert_eq!(found.len(), 1);
    assert_eq!(backend.searches().len(), 1);
}

#[tokio::test]
async fn test_search_replaces_list_and_load_more_merges() {
    let records = vec![
        event_on("e1", "2024-01-01T09:00:00Z"),
        event_on("e2", "2024-01-02T09:00:00Z"),
        event_on("e3", "2024-01-03T09:00:00Z"),
    ];
    let (_temp_dir, planner, backend) =
        create_test_planner(MockBackend::new().with_records(records), 50).await;

    let first = planner
        .search(CombinedSearch {
            max_results: 2,
            ..Default::default()
        })
        .await
        .expect("search should succeed");
    assert_eq!(first.len(), 2);

    let more = planner.load_more().await.expect("load more should succeed");
    assert_eq!(more.len(), 3);

    let state = planner.list_state();
    assert_eq!(state.active_filter, ActiveFilter::Combined);
    assert_eq!(state.last_request.as_ref().map(|r| r.page()), Some(2));

    let searches = backend.searches();
    assert!(searches.iter().all(|(endpoint, _)| *endpoint == SearchEndpoint::Combined));
    assert_eq!(searches[1].1.source.from, Some(2));
}

#[tokio::test]
async fn test_load_more_without_search_is_rejected() {
    let (_temp_dir, planner, _backend) = create_test_planner(MockBackend::new(), 50).await;
    assert!(matches!(
        planner.load_more().await,
        Err(PlanningError::InvalidInput { .. })
    ));
}

#[tokio::test]
async fn test_refetch_replays_every_loaded_page() {
    let records: Vec<Record> = (1..=5)
        .map(|day| event_on(&format!("e{day}"), &format!("2024-01-0{day}T09:00:00Z")))
        .collect();
    let (_temp_dir, planner, backend) =
        create_test_planner(MockBackend::new().with_records(records), 50).await;

    planner
        .search(CombinedSearch {
            max_results: 2,
            ..Default::default()
        })
        .await
        .expect("search should succeed");
    planner.load_more().await.expect("load more should succeed");
    planner.load_more().await.expect("load more should succeed");
    let before = backend.searches().len();

    let outcome = planner.refetch().await.expect("refetch should succeed");
    assert_eq!(backend.searches().len() - before, 3);
    assert_eq!(outcome.into_groups().len(), 5);
}

#[tokio::test]
async fn test_refetch_aborts_after_filter_switch() {
    let mock = MockBackend::new().with_records([event_on("e1", "2024-01-01T09:00:00Z")]);
    let (_temp_dir, planner, backend) = create_test_planner(mock, 50).await;

    planner.search(CombinedSearch::default()).await.expect("search should succeed");
    planner
        .set_active_filter(ActiveFilter::Planning)
        .await
        .expect("filter switch should succeed");
    let before = backend.searches().len();

    let outcome = planner.refetch().await.expect("refetch should resolve");
    assert_eq!(outcome, RefetchOutcome::Aborted);
    assert_eq!(backend.searches().len(), before);
    assert_eq!(planner.list_state().groups.len(), 1);
}

#[tokio::test]
async fn test_fetch_planning_prefers_cache_unless_forced() {
    let (_temp_dir, planner, backend) =
        create_test_planner(existing_backend(), 50).await;

    planner.fetch_planning_by_id("p1", false).await.expect("first fetch");
    planner.fetch_planning_by_id("p1", false).await.expect("cached fetch");
    planner.fetch_planning_by_id("p1", true).await.expect("forced fetch");

    let gets = backend
        .calls()
        .into_iter()
        .filter(|call| matches!(call, MockCall::GetPlanning(_)))
        .count();
    assert_eq!(gets, 2);
}

#[tokio::test]
async fn test_fetch_planning_caches_linked_event() {
    let mut item = existing_item();
    item.event_item = Some("e1".to_string());
    let backend = MockBackend::new().with_records([
        Record::Planning(item),
        event_on("e1", "2024-01-01T09:00:00Z"),
    ]);
    let (_temp_dir, planner, backend) = create_test_planner(backend, 50).await;

    planner.fetch_planning_by_id("p1", false).await.expect("fetch");
    planner.fetch_planning_by_id("p1", true).await.expect("forced fetch");

    let event_searches = backend
        .searches()
        .into_iter()
        .filter(|(endpoint, _)| *endpoint == SearchEndpoint::Events)
        .count();
    assert_eq!(event_searches, 1);
}

#[tokio::test]
async fn test_save_existing_item_writes_coverages_before_parent() {
    let original = existing_item();
    let backend = MockBackend::new()
        .with_records([Record::Planning(original.clone())])
        .with_coverage_latency(Duration::from_millis(20));
    let (_temp_dir, planner, backend) = create_test_planner(backend, 50).await;

    let mut edited = original.clone();
    edited.slugline = Some("budget-final".to_string());
    edited.coverages.remove(1);
    edited.coverages.push(Coverage::scheduled_at(ts("2024-01-02T09:00:00Z")));

    let saved = planner
        .save_planning(edited, Some(original))
        .await
        .expect("save should succeed");

    let calls = backend.calls();
    let parent_index = calls
        .iter()
        .position(|call| matches!(call, MockCall::SavePlanning { .. }))
        .expect("parent saved");
    let coverage_writes: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, call)| call.is_coverage_write())
        .map(|(index, _)| index)
        .collect();
    assert_eq!(coverage_writes.len(), 2);
    assert!(coverage_writes.iter().all(|&index| index < parent_index));

    assert_eq!(saved.slugline.as_deref(), Some("budget-final"));
    assert_eq!(saved.coverages.len(), 2);
    assert!(saved.coverages.iter().all(|c| c.id.is_some()));
}

#[tokio::test]
async fn test_failed_coverage_skips_parent_save() {
    let original = existing_item();
    let backend = MockBackend::new()
        .with_records([Record::Planning(original.clone())])
        .with_failing_coverage("broken")
        .with_coverage_latency(Duration::from_millis(20));
    let (_temp_dir, planner, backend) = create_test_planner(backend, 50).await;

    let mut edited = original.clone();
    edited.coverages[0].planning.slugline = Some("broken".to_string());
    edited.coverages.push(Coverage::scheduled_at(ts("2024-01-02T09:00:00Z")));

    let err = planner
        .save_planning(edited, Some(original))
        .await
        .expect_err("save should fail");

    match err {
        PlanningError::Reconciliation { failed, total, .. } => {
            assert_eq!((failed, total), (1, 2));
        }
        other => panic!("unexpected error: {other}"),
    }

    let calls = backend.calls();
    assert!(!calls.iter().any(|call| matches!(call, MockCall::SavePlanning { .. })));
    // The slow, successful write still settled
    assert_eq!(calls.iter().filter(|call| call.is_coverage_write()).count(), 2);
}

#[tokio::test]
async fn test_save_new_item_creates_parent_then_coverages() {
    let (_temp_dir, planner, backend) = create_test_planner(MockBackend::new(), 50).await;

    let item = Planning {
        slugline: Some("election".to_string()),
        coverages: vec![Coverage::scheduled_at(ts("2024-03-01T09:00:00Z"))],
        ..Default::default()
    };
    let saved = planner.save_planning(item, None).await.expect("create should succeed");

    let calls = backend.calls();
    assert!(matches!(&calls[0], MockCall::SavePlanning { id: None, .. }));
    let MockCall::SaveCoverage(coverage) = &calls[1] else {
        panic!("expected a coverage write, got {:?}", calls[1]);
    };
    assert_eq!(coverage.planning_item, saved.id);
    assert_eq!(saved.coverages.len(), 1);

    let state = planner.list_state();
    assert_eq!(state.record_count(), 1);
}

#[tokio::test]
async fn test_spike_updates_cached_copy() {
    let (_temp_dir, planner, backend) =
        create_test_planner(existing_backend(), 50).await;

    let spiked = planner.spike_planning("p1").await.expect("spike should succeed");
    assert_eq!(spiked.state, WorkflowState::Spiked);

    let cached = planner.fetch_planning_by_id("p1", false).await.expect("cached fetch");
    assert_eq!(cached.state, WorkflowState::Spiked);
    assert!(backend.calls().contains(&MockCall::Spike("p1".to_string())));

    let restored = planner.unspike_planning("p1").await.expect("unspike should succeed");
    assert_eq!(restored.state, WorkflowState::Active);
}

fn count_creates(backend: &MockBackend) -> usize {
    backend
        .calls()
        .iter()
        .filter(|call| matches!(call, MockCall::SavePlanning { id: None, .. }))
        .count()
}

#[tokio::test]
async fn test_original_without_id_is_treated_as_new_item() {
    let (_temp_dir, planner, backend) = create_test_planner(MockBackend::new(), 50).await;

    let item = Planning {
        slugline: Some("election".to_string()),
        coverages: vec![Coverage::scheduled_at(ts("2024-03-01T09:00:00Z"))],
        ..Default::default()
    };
    let saved = planner
        .save_planning(item, Some(Planning::default()))
        .await
        .expect("create should succeed");

    let calls = backend.calls();
    assert!(matches!(&calls[0], MockCall::SavePlanning { id: None, .. }));
    let MockCall::SaveCoverage(coverage) = &calls[1] else {
        panic!("expected a coverage write, got {:?}", calls[1]);
    };
    assert_eq!(coverage.planning_item, saved.id);

    let id = saved.id.expect("created item has an ID");
    let stored = backend.stored_planning(&id).expect("item stored");
    assert_eq!(stored.coverages.len(), 1);
}

#[tokio::test]
async fn test_failed_coverage_on_new_item_keeps_created_parent() {
    let backend = MockBackend::new().with_failing_coverage("broken");
    let (_temp_dir, planner, backend) = create_test_planner(backend, 50).await;

    let mut coverage = Coverage::scheduled_at(ts("2024-03-01T09:00:00Z"));
    coverage.planning.slugline = Some("broken".to_string());
    let item = Planning {
        slugline: Some("election".to_string()),
        coverages: vec![coverage],
        ..Default::default()
    };

    let err = planner
        .save_planning(item.clone(), None)
        .await
        .expect_err("coverage pass should fail");
    let PlanningError::Reconciliation {
        planning_id: Some(id),
        ..
    } = &err
    else {
        panic!("unexpected error: {err}");
    };
    assert!(err.to_string().contains("was created without them"));

    // The created parent is cached, so a retry updates it
    let mut retry = item;
    retry.id = Some(id.clone());
    retry.coverages[0].planning.slugline = Some("fixed".to_string());
    let saved = planner
        .save_planning(retry, None)
        .await
        .expect("retry should succeed");

    assert_eq!(saved.id.as_deref(), Some(id.as_str()));
    assert_eq!(count_creates(&backend), 1);
    assert!(!backend
        .calls()
        .iter()
        .any(|call| matches!(call, MockCall::GetPlanning(_))));
}

#[tokio::test]
async fn test_save_keeps_planning_date_of_item_without_coverages() {
    let item = Planning {
        id: Some("p1".to_string()),
        etag: Some("etag-0".to_string()),
        slugline: Some("budget".to_string()),
        planning_date: Some(ts("2024-01-05T08:00:00Z")),
        ..Default::default()
    };
    let mock = MockBackend::new().with_records([Record::Planning(item.clone())]);
    let (_temp_dir, planner, _backend) = create_test_planner(mock, 50).await;
    planner.search(CombinedSearch::default()).await.expect("search should succeed");
    assert_eq!(planner.list_state().record_count(), 1);

    let mut edited = item.clone();
    edited.slugline = Some("budget-final".to_string());
    let saved = planner
        .save_planning(edited, Some(item.clone()))
        .await
        .expect("save should succeed");

    assert_eq!(saved.planning_date, item.planning_date);
    let state = planner.list_state();
    assert_eq!(state.record_count(), 1);
    let listed = state.groups[0].items[0]
        .as_planning()
        .expect("listed record is planning");
    assert_eq!(listed.slugline.as_deref(), Some("budget-final"));
}

#[tokio::test]
async fn test_spiked_item_leaves_active_list() {
    let (_temp_dir, planner, _backend) =
        create_test_planner(existing_backend(), 50).await;
    planner
        .search_planning(planner.planning_search())
        .await
        .expect("search should succeed");
    assert_eq!(planner.list_state().record_count(), 1);

    planner.spike_planning("p1").await.expect("spike should succeed");
    assert_eq!(planner.list_state().record_count(), 0);

    planner.unspike_planning("p1").await.expect("unspike should succeed");
    assert_eq!(planner.list_state().record_count(), 1);
}

#[tokio::test]
async fn test_missing_item_is_evicted_from_cache_and_list() {
    let (_temp_dir, planner, backend) =
        create_test_planner(existing_backend(), 50).await;
    planner.search(CombinedSearch::default()).await.expect("search should succeed");
    planner.fetch_planning_by_id("p1", false).await.expect("fetch");

    backend.remove_planning("p1");
    let err = planner
        .fetch_planning_by_id("p1", true)
        .await
        .expect_err("item is gone");
    assert!(matches!(err, PlanningError::NotFound { .. }));
    assert_eq!(planner.list_state().record_count(), 0);

    let before = backend.call_count();
    assert!(planner.fetch_planning_by_id("p1", false).await.is_err());
    assert!(matches!(
        backend.calls().get(before),
        Some(MockCall::GetPlanning(_))
    ));
}

#[tokio::test]
async fn test_fetch_coverage_refreshes_cached_parent() {
    let (_temp_dir, planner, backend) =
        create_test_planner(existing_backend(), 50).await;
    planner.fetch_planning_by_id("p1", false).await.expect("fetch");

    let mut changed = existing_item().coverages[0].clone();
    changed.planning.slugline = Some("late edition".to_string());
    backend.save_coverage(&changed).await.expect("backend write");

    let coverage = planner
        .fetch_coverage_by_id("c1")
        .await
        .expect("coverage fetch should succeed");
    assert_eq!(coverage.planning.slugline.as_deref(), Some("late edition"));

    let cached = planner.fetch_planning_by_id("p1", false).await.expect("cached fetch");
    assert_eq!(cached.coverages.len(), 2);
    assert_eq!(
        cached.coverages[0].planning.slugline.as_deref(),
        Some("late edition")
    );
}

#[tokio::test]
async fn test_fetch_planning_history() {
    let entry = |id: &str, created: &str| PlanningHistory {
        id: Some(id.to_string()),
        planning_id: "p1".to_string(),
        operation: "update".to_string(),
        created: Some(ts(created)),
        ..Default::default()
    };
    let backend = MockBackend::new().with_history([
        entry("h2", "2024-01-02T00:00:00Z"),
        entry("h1", "2024-01-01T00:00:00Z"),
    ]);
    let (_temp_dir, planner, backend) = create_test_planner(backend, 50).await;

    let history = planner.fetch_planning_history("p1").await.expect("history");
    let ids: Vec<&str> = history.iter().filter_map(|entry| entry.id.as_deref()).collect();
    assert_eq!(ids, vec!["h1", "h2"]);
    assert!(backend.calls().contains(&MockCall::History("p1".to_string())));
}

#[tokio::test]
async fn test_lock_and_unlock_update_cached_copy() {
    let (_temp_dir, planner, backend) =
        create_test_planner(existing_backend(), 50).await;

    let locked = planner.lock_planning("p1").await.expect("lock should succeed");
    assert!(locked.is_locked());
    assert_eq!(locked.lock_action.as_deref(), Some("edit"));
    let cached = planner.fetch_planning_by_id("p1", false).await.expect("cached fetch");
    assert!(cached.is_locked());

    let unlocked = planner.unlock_planning("p1").await.expect("unlock should succeed");
    assert!(!unlocked.is_locked());
    assert!(backend.calls().contains(&MockCall::Unlock("p1".to_string())));
}

fn agenda(id: &str, enabled: bool) -> Agenda {
    Agenda {
        id: id.to_string(),
        name: Some(format!("Agenda {id}")),
        is_enabled: Some(enabled),
    }
}

#[tokio::test]
async fn test_new_item_requires_an_enabled_agenda() {
    let backend = MockBackend::new().with_agendas([agenda("a1", true), agenda("a2", false)]);
    let (_temp_dir, planner, backend) = create_test_planner(backend, 50).await;
    let item = Planning {
        slugline: Some("election".to_string()),
        ..Default::default()
    };

    let err = planner
        .save_planning_in_agenda(item.clone(), None)
        .await
        .expect_err("agenda is required");
    assert!(err.to_string().contains("No Agenda is currently selected."));

    let err = planner
        .save_planning_in_agenda(item.clone(), Some("a2"))
        .await
        .expect_err("disabled agenda is rejected");
    assert!(err.to_string().contains("disabled Agenda"));
    assert_eq!(count_creates(&backend), 0);

    let saved = planner
        .save_planning_in_agenda(item, Some("a1"))
        .await
        .expect("create should succeed");
    assert_eq!(saved.agendas.len(), 1);
    let payload = backend
        .calls()
        .into_iter()
        .find_map(|call| match call {
            MockCall::SavePlanning { payload, .. } => Some(payload),
            _ => None,
        })
        .expect("parent created");
    assert_eq!(payload["agendas"], serde_json::json!(["a1"]));
}

#[tokio::test]
async fn test_existing_item_skips_agenda_check() {
    let (_temp_dir, planner, backend) =
        create_test_planner(existing_backend(), 50).await;

    let mut edited = existing_item();
    edited.slugline = Some("budget-final".to_string());
    planner
        .save_planning_in_agenda(edited, None)
        .await
        .expect("save should succeed");
    assert!(!backend
        .calls()
        .iter()
        .any(|call| matches!(call, MockCall::GetAgenda(_))));
}
