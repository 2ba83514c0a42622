//! High-level planner API.
//!
//! The [`Planner`] ties the pure building blocks together: it builds queries,
//! talks to the [`Backend`], keeps the local cache current and owns the
//! date-grouped [`ListState`].
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  search_ops     │    │  query / list / │    │    Backend      │
//! │  planning_ops   │───▶│  reconcile      │───▶│  + db/ cache    │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//!   Orchestration          Pure logic             I/O
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: Factory for [`Planner`] instances
//! - [`search_ops`]: Searching, "load more" and refetching the list
//! - [`planning_ops`]: Fetching, saving and spiking planning items
//!
//! # Usage
//!
//! ```rust,no_run
//! use almanac_core::{PlannerBuilder, params::CombinedSearch};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let planner = PlannerBuilder::new()
//!     .with_backend_url(Some("https://newsroom.example.org/api"))
//!     .build()
//!     .await?;
//!
//! let groups = planner.search(planner.combined_search()).await?;
//! for group in &groups {
//!     println!("{}: {} item(s)", group.date, group.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The list state sits behind a [`std::sync::Mutex`]; it is only locked for
//! short synchronous sections and never across an `.await`.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use jiff::Timestamp;
use jiff::tz::TimeZone;
use tokio::task;

pub mod builder;
pub mod planning_ops;
pub mod search_ops;

#[cfg(test)]
mod tests;

pub use builder::PlannerBuilder;

use crate::backend::Backend;
use crate::db::Database;
use crate::error::{PlanningError, Result};
use crate::list::ListState;
use crate::params::{CombinedSearch, PlanningSearch};
use crate::query::QueryContext;

/// Settings that shape queries and grouping.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Largest number of IDs sent in one lookup
    pub chunk_size: usize,
    /// Records per page for new searches
    pub page_size: u32,
    /// Zone used for "today" and for grouping records by day
    pub time_zone: TimeZone,
}

/// Main planner interface.
pub struct Planner {
    pub(crate) db_path: PathBuf,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) config: PlannerConfig,
    state: Mutex<ListState>,
}

impl Planner {
    pub(crate) fn new(
        db_path: PathBuf,
        backend: Arc<dyn Backend>,
        config: PlannerConfig,
        state: ListState,
    ) -> Self {
        Self {
            db_path,
            backend,
            config,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// A combined search for the first page, sized per the configuration.
    pub fn combined_search(&self) -> CombinedSearch {
        CombinedSearch {
            max_results: self.config.page_size,
            ..Default::default()
        }
    }

    /// A planning search for the first page, sized per the configuration.
    pub fn planning_search(&self) -> PlanningSearch {
        PlanningSearch {
            max_results: self.config.page_size,
            ..Default::default()
        }
    }

    /// Snapshot of the current list view.
    pub fn list_state(&self) -> ListState {
        self.lock_state().clone()
    }

    pub(crate) fn query_context(&self) -> QueryContext {
        QueryContext::new(self.config.chunk_size, &self.config.time_zone, Timestamp::now())
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ListState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Runs `operation` against a fresh cache connection on the blocking pool.
    pub(crate) async fn with_database<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            operation(&mut db)
        })
        .await
        .map_err(|e| PlanningError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Writes the current list view to the cache.
    pub(crate) async fn persist_state(&self) -> Result<()> {
        let snapshot = self.list_state();
        self.with_database(move |db| db.save_list_state(&snapshot))
            .await
    }
}
