//! Data models for events, planning items and coverages.
//!
//! The models mirror the backend documents closely: reserved fields keep
//! their `_`-prefixed wire names through serde renames, so the same types are
//! used for decoding search results, caching them locally and building save
//! payloads. Display implementations live in [`crate::display`].
//!
//! # Examples
//!
//! ```rust
//! use almanac_core::models::{Coverage, Planning, Record};
//! use jiff::Timestamp;
//!
//! let early: Timestamp = "2024-01-01T09:00:00Z".parse().unwrap();
//! let late: Timestamp = "2024-01-03T09:00:00Z".parse().unwrap();
//! let planning = Planning {
//!     id: Some("p1".to_string()),
//!     coverages: vec![Coverage::scheduled_at(late), Coverage::scheduled_at(early)],
//!     ..Default::default()
//! };
//!
//! let record = Record::from(planning);
//! assert_eq!(record.schedule_date(), Some(early));
//! ```

pub mod coverage;
pub mod event;
pub mod group;
pub mod history;
pub mod planning;
pub mod record;
pub mod state;


use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use coverage::{Coverage, CoveragePlanning, Genre, genre_from_wire, genre_to_wire};
pub use event::{Event, EventDates};
pub use group::{DateGroup, GroupOrder};
pub use history::PlanningHistory;
pub use planning::{Agenda, AgendaRef, Planning};
pub use record::{ItemType, Record, RecordKey};
pub use state::{SpikeState, WorkflowState};

/// A controlled-vocabulary value (category, subject, genre, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct QCode {
    pub qcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl QCode {
    pub fn new(qcode: impl Into<String>) -> Self {
        Self {
            qcode: qcode.into(),
            name: None,
        }
    }
}

/// Drops the `_`-prefixed top-level keys of a document, which the backend
/// owns and rejects on write.
pub fn strip_reserved_fields(value: Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .collect(),
        ),
        other => other,
    }
}
