//! The date-grouped list view and the request that produced it.
//!
//! [`ListState`] is owned by the [`Planner`](crate::Planner) and only ever
//! rebuilt through [`merge`]: a fresh search replaces the groups, "load more"
//! merges the next page into them and a refetch rebuilds them page by page
//! through [`refetch::RefetchCoordinator`].

pub mod merge;
pub mod refetch;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{DateGroup, GroupOrder, Record};
use crate::params::{CombinedSearch, EventIds, PlanningSearch};

/// Which list the user is looking at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActiveFilter {
    /// Events and ad-hoc planning items together
    #[default]
    Combined,
    Planning,
}

impl ActiveFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveFilter::Combined => "combined",
            ActiveFilter::Planning => "planning",
        }
    }
}

impl fmt::Display for ActiveFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActiveFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "combined" => Ok(ActiveFilter::Combined),
            "planning" => Ok(ActiveFilter::Planning),
            _ => Err(format!("Unknown list filter: {s}")),
        }
    }
}

/// The last search applied to the list; replayed by "load more" and refetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "lowercase")]
pub enum ListRequest {
    Combined(CombinedSearch),
    Planning(PlanningSearch),
}

impl ListRequest {
    pub fn filter(&self) -> ActiveFilter {
        match self {
            ListRequest::Combined(_) => ActiveFilter::Combined,
            ListRequest::Planning(_) => ActiveFilter::Planning,
        }
    }

    /// The last page loaded so far.
    pub fn page(&self) -> u32 {
        match self {
            ListRequest::Combined(search) => search.page,
            ListRequest::Planning(search) => search.page,
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        let mut request = self.clone();
        match &mut request {
            ListRequest::Combined(search) => search.page = page,
            ListRequest::Planning(search) => search.page = page,
        }
        request
    }

    /// Whether `record` still belongs in the list this request produced.
    ///
    /// Only the filters that can be decided from the record itself are
    /// checked: spike state, agendas, linked events and, for the combined
    /// list, that planning items are ad-hoc.
    pub fn admits(&self, record: &Record) -> bool {
        match (self, record) {
            (ListRequest::Combined(search), Record::Event(event)) => {
                search.spike_state.admits(&event.state)
            }
            (ListRequest::Combined(search), Record::Planning(planning)) => {
                planning.event_item.is_none() && search.spike_state.admits(&planning.state)
            }
            (ListRequest::Planning(_), Record::Event(_)) => false,
            (ListRequest::Planning(search), Record::Planning(planning)) => {
                if let Some(event_ids) = &search.event_ids {
                    return planning.event_item.as_ref().is_some_and(|event| match event_ids {
                        EventIds::One(id) => id == event,
                        EventIds::Many(ids) => ids.contains(event),
                    });
                }
                let in_agenda = match &search.agendas {
                    Some(agendas) => planning
                        .agendas
                        .iter()
                        .any(|agenda| agendas.iter().any(|id| id == agenda.id())),
                    None if search.no_agenda_assigned => planning.agendas.is_empty(),
                    None => true,
                };
                in_agenda && search.state.unwrap_or_default().admits(&planning.state)
            }
        }
    }

    /// Past-looking planning lists show the most recent coverage first.
    pub fn order(&self) -> GroupOrder {
        match self {
            ListRequest::Planning(search) if !search.only_future && search.event_ids.is_none() => {
                GroupOrder::Descending
            }
            _ => GroupOrder::Ascending,
        }
    }
}

/// Client-side list state, persisted between CLI invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListState {
    pub active_filter: ActiveFilter,
    pub groups: Vec<DateGroup>,
    pub last_request: Option<ListRequest>,
}

impl ListState {
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(DateGroup::len).sum()
    }
}
