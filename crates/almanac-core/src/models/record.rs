//! The tagged union of everything the search backend returns.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Event, Planning};

/// Type tag of a record, as carried in the `_type` field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Events,
    Planning,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Events => "events",
            ItemType::Planning => "planning",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a record: IDs are only unique within a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub item_type: ItemType,
    pub id: String,
}

/// An event or planning document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "_type")]
pub enum Record {
    #[serde(rename = "events")]
    Event(Event),
    #[serde(rename = "planning")]
    Planning(Planning),
}

impl Record {
    pub fn item_type(&self) -> ItemType {
        match self {
            Record::Event(_) => ItemType::Events,
            Record::Planning(_) => ItemType::Planning,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Record::Event(event) => Some(&event.id),
            Record::Planning(planning) => planning.id.as_deref(),
        }
    }

    /// Identity key, or `None` for a planning item that was never saved.
    pub fn key(&self) -> Option<RecordKey> {
        self.id().map(|id| RecordKey {
            item_type: self.item_type(),
            id: id.to_string(),
        })
    }

    pub fn schedule_date(&self) -> Option<Timestamp> {
        match self {
            Record::Event(event) => event.schedule_date(),
            Record::Planning(planning) => planning.schedule_date(),
        }
    }

    pub fn slugline(&self) -> Option<&str> {
        match self {
            Record::Event(event) => event.slugline.as_deref(),
            Record::Planning(planning) => planning.slugline.as_deref(),
        }
    }

    pub fn as_planning(&self) -> Option<&Planning> {
        match self {
            Record::Planning(planning) => Some(planning),
            Record::Event(_) => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Record::Event(event) => Some(event),
            Record::Planning(_) => None,
        }
    }
}

impl From<Planning> for Record {
    fn from(planning: Planning) -> Self {
        Record::Planning(planning)
    }
}

impl From<Event> for Record {
    fn from(event: Event) -> Self {
        Record::Event(event)
    }
}
