//! Builder for creating and configuring Planner instances.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jiff::tz::TimeZone;
use log::debug;
use tokio::task;

use super::{Planner, PlannerConfig};
use crate::{
    backend::{Backend, HttpBackend},
    db::Database,
    error::{PlanningError, Result},
    params::DEFAULT_PAGE_SIZE,
    query::DEFAULT_CHUNK_SIZE,
};

/// Builder for creating and configuring Planner instances.
#[derive(Clone)]
pub struct PlannerBuilder {
    database_path: Option<PathBuf>,
    backend_url: Option<String>,
    token: Option<String>,
    backend: Option<Arc<dyn Backend>>,
    chunk_size: usize,
    page_size: u32,
    time_zone: Option<TimeZone>,
}

impl PlannerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            database_path: None,
            backend_url: None,
            token: None,
            backend: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            time_zone: None,
        }
    }

    /// Sets a custom cache file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/almanac/almanac.db` or `~/.local/share/almanac/almanac.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Base URL of the REST API, e.g. `https://newsroom.example.org/api`.
    pub fn with_backend_url<S: Into<String>>(mut self, url: Option<S>) -> Self {
        if let Some(url) = url {
            self.backend_url = Some(url.into());
        }
        self
    }

    /// Value sent in the `Authorization` header.
    pub fn with_token<S: Into<String>>(mut self, token: Option<S>) -> Self {
        if let Some(token) = token {
            self.token = Some(token.into());
        }
        self
    }

    /// Uses the given backend instead of connecting over HTTP.
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Zone used for "today" and for grouping. Defaults to the system zone.
    pub fn with_time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = Some(time_zone);
        self
    }

    /// Builds the configured planner instance.
    ///
    /// # Errors
    ///
    /// Returns `PlanningError::InvalidInput` for a zero chunk or page size
    /// Returns `PlanningError::Configuration` if no backend is configured
    /// Returns `PlanningError::FileSystem` if the cache path is invalid
    /// Returns `PlanningError::Database` if cache initialization fails
    pub async fn build(self) -> Result<Planner> {
        if self.chunk_size == 0 {
            return Err(
                PlanningError::invalid_input("chunk_size").with_reason("must be at least 1")
            );
        }
        if self.page_size == 0 {
            return Err(PlanningError::invalid_input("page_size").with_reason("must be at least 1"));
        }

        let backend: Arc<dyn Backend> = match (self.backend, self.backend_url) {
            (Some(backend), _) => backend,
            (None, Some(url)) => Arc::new(HttpBackend::new(url, self.token.as_deref())?),
            (None, None) => {
                return Err(PlanningError::Configuration {
                    message: "No backend configured: set a backend URL".to_string(),
                });
            }
        };

        let db_path = if let Some(path) = self.database_path {
            path
        } else {
            Self::default_database_path()?
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PlanningError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let db_path_clone = db_path.clone();
        let state = task::spawn_blocking(move || {
            let db = Database::new(&db_path_clone)?;
            db.load_list_state()
        })
        .await
        .map_err(|e| PlanningError::Configuration {
            message: format!("Task join error: {e}"),
        })??;
        debug!(
            "Opened cache at {} with {} listed record(s)",
            db_path.display(),
            state.record_count()
        );

        let config = PlannerConfig {
            chunk_size: self.chunk_size,
            page_size: self.page_size,
            time_zone: self.time_zone.unwrap_or_else(TimeZone::system),
        };
        Ok(Planner::new(db_path, backend, config, state))
    }

    /// Returns the default cache path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("almanac")
            .place_data_file("almanac.db")
            .map_err(|e| PlanningError::XdgDirectory(e.to_string()))
    }
}

impl Default for PlannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
