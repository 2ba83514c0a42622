#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use almanac_core::{
    MockBackend, Planner, PlannerBuilder,
    models::{Coverage, Event, EventDates, Planning, Record},
};
use jiff::{Timestamp, tz::TimeZone};
use tempfile::TempDir;

/// Helper function to create a test planner over a mock backend
pub async fn create_test_planner(backend: MockBackend) -> (TempDir, Planner, Arc<MockBackend>) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let backend = Arc::new(backend);
    let planner = build_planner(temp_dir.path(), backend.clone()).await;
    (temp_dir, planner, backend)
}

/// Builds a planner on the cache inside `dir`, in UTC.
pub async fn build_planner(dir: &Path, backend: Arc<MockBackend>) -> Planner {
    PlannerBuilder::new()
        .with_database_path(Some(dir.join("test.db")))
        .with_backend(backend)
        .with_time_zone(TimeZone::UTC)
        .with_chunk_size(2)
        .build()
        .await
        .expect("Failed to create planner")
}

pub fn ts(text: &str) -> Timestamp {
    text.parse().expect("fixture timestamp should parse")
}

pub fn event(id: &str, start: &str) -> Record {
    Record::Event(Event {
        id: id.to_string(),
        name: Some(format!("{id} event")),
        dates: Some(EventDates {
            start: ts(start),
            end: ts(start),
            tz: None,
        }),
        ..Default::default()
    })
}

pub fn planning(id: &str, scheduled: &str) -> Planning {
    Planning {
        id: Some(id.to_string()),
        etag: Some(format!("{id}-etag")),
        slugline: Some(format!("{id}-slug")),
        coverages: vec![Coverage {
            id: Some(format!("{id}-c1")),
            planning_item: Some(id.to_string()),
            ..Coverage::scheduled_at(ts(scheduled))
        }],
        ..Default::default()
    }
}

pub fn linked_planning(id: &str, event_id: &str, scheduled: &str) -> Record {
    Record::Planning(Planning {
        event_item: Some(event_id.to_string()),
        ..planning(id, scheduled)
    })
}
