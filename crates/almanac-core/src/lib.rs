//! Core library for the Almanac editorial planning client.
//!
//! Almanac searches a newsroom planning backend for events and planning
//! items, presents the results as a list grouped by day, keeps that list
//! consistent across "load more" and refetches, and saves planning items
//! together with their coverages.
//!
//! # Architecture
//!
//! - **Query building** ([`query`]): pure translation of search parameters
//!   into backend query documents
//! - **Batched lookups** ([`fetch`]): splitting long ID lists into
//!   backend-sized requests
//! - **List maintenance** ([`list`]): merging pages into date groups and
//!   refetching every loaded page
//! - **Coverage reconciliation** ([`reconcile`]): deciding which coverages to
//!   write and delete when a planning item is saved
//! - **Persistence** ([`planner`]): the [`Planner`] orchestrating the above
//!   against a [`backend::Backend`] and the local cache ([`db`])
//! - **Display** ([`display`]): markdown formatting for the terminal
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use almanac_core::{PlannerBuilder, display::Groups};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let planner = PlannerBuilder::new()
//!     .with_backend_url(Some("https://newsroom.example.org/api"))
//!     .with_database_path(Some("almanac.db"))
//!     .build()
//!     .await?;
//!
//! let groups = planner.search(planner.combined_search()).await?;
//! println!("{}", Groups(&groups));
//!
//! let groups = planner.load_more().await?;
//! println!("{} record(s) listed", Groups(&groups).record_count());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod db;
pub mod display;
pub mod error;
pub mod fetch;
pub mod list;
pub mod models;
pub mod params;
pub mod planner;
pub mod query;
pub mod reconcile;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use backend::{Backend, HttpBackend, MockBackend};
pub use db::Database;
pub use error::{PlanningError, Result};
pub use list::{ActiveFilter, ListRequest, ListState, refetch::RefetchOutcome};
pub use models::{Coverage, DateGroup, Event, Planning, Record};
pub use params::{AdvancedSearch, CombinedSearch, EventIds, PlanningSearch};
pub use planner::{Planner, PlannerBuilder, PlannerConfig};
