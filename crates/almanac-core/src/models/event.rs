//! Event model definition.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{QCode, WorkflowState};

/// Start and end of an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDates {
    pub start: Timestamp,
    pub end: Timestamp,
    /// IANA name of the zone the event was entered in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
}

/// Something happening in the world that planning items may cover.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slugline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_short: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<EventDates>,

    #[serde(default)]
    pub state: WorkflowState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubstatus: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anpa_category: Vec<QCode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject: Vec<QCode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calendars: Vec<QCode>,

    /// Planning items created for this event
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub planning_ids: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// The instant the event is grouped and sorted by.
    pub fn schedule_date(&self) -> Option<Timestamp> {
        self.dates.as_ref().map(|dates| dates.start)
    }
}
