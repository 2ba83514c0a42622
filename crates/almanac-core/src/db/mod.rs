//! Local SQLite cache.
//!
//! The cache keeps the records fetched from the backend, keyed by type and
//! ID, and the current list view, so that "load more" and refetch work across
//! CLI invocations and saves can diff against the last known version of an
//! item without a network round-trip.

use std::path::Path;

use rusqlite::Connection;

use crate::error::{DatabaseResultExt, Result};

pub mod migrations;
pub mod record_queries;
pub mod state_queries;

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Opens (creating if needed) the cache at `path` and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}
