//! Planning item model definition.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Coverage, QCode, WorkflowState};

/// An agenda reference as found on a planning item.
///
/// Items fetched with embedded agendas carry the whole agenda document, while
/// the backend only accepts agenda IDs on write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AgendaRef {
    Id(String),
    Embedded(Agenda),
}

impl AgendaRef {
    pub fn id(&self) -> &str {
        match self {
            AgendaRef::Id(id) => id,
            AgendaRef::Embedded(agenda) => &agenda.id,
        }
    }
}

/// A named grouping of planning items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agenda {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
}

/// A planning item together with its coverages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Planning {
    /// Absent for items that have not been created yet
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "_etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slugline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ednote: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agendas: Vec<AgendaRef>,

    /// ID of the event this item was created for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_item: Option<String>,

    #[serde(default)]
    pub state: WorkflowState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubstatus: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anpa_category: Vec<QCode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject: Vec<QCode>,

    /// Server-computed date used when the item has no scheduled coverage
    #[serde(
        rename = "_planning_date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub planning_date: Option<Timestamp>,

    /// Coverages in insertion order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coverages: Vec<Coverage>,

    /// User holding the edit lock, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_session: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_time: Option<Timestamp>,

    /// Embedded creator document; read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_creator: Option<Value>,

    /// Fields this crate does not model, kept so that a read-edit-save
    /// cycle writes them back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Planning {
    /// The instant the item is grouped and sorted by: the earliest scheduled
    /// coverage, falling back to the planning date.
    pub fn schedule_date(&self) -> Option<Timestamp> {
        self.coverages
            .iter()
            .filter_map(|coverage| coverage.planning.scheduled)
            .min()
            .or(self.planning_date)
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_locked(&self) -> bool {
        self.lock_user.is_some()
    }
}
