//! Access to the remote search and storage backend.
//!
//! [`Backend`] is the seam between the planner and the network. The planner
//! only ever holds an `Arc<dyn Backend>`, so tests and embedders can swap the
//! HTTP implementation for [`MockBackend`].

mod http;
mod mock;

pub use http::HttpBackend;
pub use mock::{MockBackend, MockCall};

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{Agenda, Coverage, Planning, PlanningHistory, Record};
use crate::query::SearchRequest;

/// Searchable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchEndpoint {
    Planning,
    Events,
    /// The federated index holding both record types
    Combined,
}

impl SearchEndpoint {
    pub fn resource(&self) -> &'static str {
        match self {
            SearchEndpoint::Planning => "planning",
            SearchEndpoint::Events => "events",
            SearchEndpoint::Combined => "planning_search",
        }
    }

    /// Type tag to assume for hits that do not carry one.
    pub fn default_type(&self) -> Option<&'static str> {
        match self {
            SearchEndpoint::Planning => Some("planning"),
            SearchEndpoint::Events => Some("events"),
            SearchEndpoint::Combined => None,
        }
    }
}

impl fmt::Display for SearchEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource())
    }
}

/// Operations the planner needs from the backend.
///
/// Failures are reported as [`PlanningError::Backend`] when the backend
/// answered, or [`PlanningError::Http`] when it could not be reached.
///
/// [`PlanningError::Backend`]: crate::PlanningError::Backend
/// [`PlanningError::Http`]: crate::PlanningError::Http
#[async_trait]
pub trait Backend: Send + Sync {
    /// Runs a search and returns its hits in backend order.
    async fn search(&self, endpoint: SearchEndpoint, request: &SearchRequest)
        -> Result<Vec<Record>>;

    /// Fetches the stored version of a planning item.
    async fn get_planning(&self, id: &str) -> Result<Planning>;

    /// Creates a planning item when `existing` is `None`, otherwise updates
    /// it. `payload` carries the top-level fields only.
    async fn save_planning(&self, existing: Option<&Planning>, payload: &Value) -> Result<Planning>;

    /// Creates or updates a single coverage.
    async fn save_coverage(&self, coverage: &Coverage) -> Result<Coverage>;

    async fn delete_coverage(&self, coverage: &Coverage) -> Result<()>;

    async fn spike_planning(&self, planning: &Planning) -> Result<Planning>;

    async fn unspike_planning(&self, planning: &Planning) -> Result<Planning>;

    /// Fetches a single coverage.
    async fn get_coverage(&self, id: &str) -> Result<Coverage>;

    /// Fetches the recorded actions on a planning item, oldest first.
    async fn planning_history(&self, planning_id: &str) -> Result<Vec<PlanningHistory>>;

    /// Takes the edit lock on a planning item and returns the locked item.
    async fn lock_planning(&self, planning: &Planning) -> Result<Planning>;

    async fn unlock_planning(&self, planning: &Planning) -> Result<Planning>;

    async fn get_agenda(&self, id: &str) -> Result<Agenda>;
}
