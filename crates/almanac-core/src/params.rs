//! Parameter structures for search operations
//!
//! These structures are shared by every interface that drives the client
//! (the CLI today) and carry no framework-specific derives beyond serde, so
//! the last request of a list can be stored and replayed as-is.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Core Params    │    │  Query Builders │
//! │  (clap derives) │───▶│ (serde derives) │───▶│  (query::*)     │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::models::SpikeState;

/// Default number of records per page, matching the backend default.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Page size for lookups by ID, which are expected to fit on one page.
pub const LOOKUP_PAGE_SIZE: u32 = 200;

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Event reference(s) used to look up the planning items of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventIds {
    One(String),
    Many(Vec<String>),
}

/// Metadata criteria shared by the event and planning searches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedSearch {
    /// Category qcodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anpa_category: Vec<String>,
    /// Subject qcodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slugline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubstatus: Option<String>,
}

impl AdvancedSearch {
    pub fn is_empty(&self) -> bool {
        self.anpa_category.is_empty()
            && self.subject.is_empty()
            && self.slugline.is_none()
            && self.pubstatus.is_none()
    }
}

/// Parameters for querying planning items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningSearch {
    /// Look up the planning items of exactly these events; every other
    /// filter is ignored when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_ids: Option<EventIds>,
    /// Spike filter; `None` behaves like [`SpikeState::Active`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SpikeState>,
    /// Agenda IDs; takes precedence over `no_agenda_assigned`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agendas: Option<Vec<String>>,
    #[serde(default)]
    pub no_agenda_assigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulltext: Option<String>,
    /// Coverages scheduled from today on (`true`) or before today (`false`)
    #[serde(default)]
    pub only_future: bool,
    #[serde(default)]
    pub advanced_search: AdvancedSearch,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub max_results: u32,
}

impl Default for PlanningSearch {
    fn default() -> Self {
        Self {
            event_ids: None,
            state: None,
            agendas: None,
            no_agenda_assigned: false,
            fulltext: None,
            only_future: false,
            advanced_search: AdvancedSearch::default(),
            page: first_page(),
            max_results: default_page_size(),
        }
    }
}

impl PlanningSearch {
    /// Search for the planning items of the given events, in any state.
    pub fn for_events(event_ids: Vec<String>) -> Self {
        Self {
            event_ids: Some(EventIds::Many(event_ids)),
            state: Some(SpikeState::All),
            max_results: LOOKUP_PAGE_SIZE,
            ..Default::default()
        }
    }
}

/// Parameters for the combined events-and-planning view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedSearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulltext: Option<String>,
    #[serde(default)]
    pub spike_state: SpikeState,
    #[serde(default)]
    pub advanced_search: AdvancedSearch,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub max_results: u32,
}

impl Default for CombinedSearch {
    fn default() -> Self {
        Self {
            fulltext: None,
            spike_state: SpikeState::default(),
            advanced_search: AdvancedSearch::default(),
            page: first_page(),
            max_results: default_page_size(),
        }
    }
}
