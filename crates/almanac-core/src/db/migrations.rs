//! Database schema initialization and versioning.

use crate::error::{DatabaseResultExt, PlanningError, Result};

/// Schema version written by this build.
pub const SCHEMA_VERSION: i64 = 1;

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        let version = self.schema_version()?;
        if version > SCHEMA_VERSION {
            return Err(PlanningError::Configuration {
                message: format!(
                    "Cache schema version {version} is newer than the supported version {SCHEMA_VERSION}"
                ),
            });
        }

        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        self.apply_migrations(version)
    }

    /// Version stamped into the file, 0 for a fresh database.
    pub fn schema_version(&self) -> Result<i64> {
        self.connection
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .db_context("Failed to read schema version")
    }

    fn apply_migrations(&self, from: i64) -> Result<()> {
        if from < SCHEMA_VERSION {
            self.connection
                .execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
                .db_context("Failed to stamp schema version")?;
        }
        Ok(())
    }
}
