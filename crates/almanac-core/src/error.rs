//! Error types for the planning client library.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all planning client operations.
#[derive(Error, Debug)]
pub enum PlanningError {
    /// The backend answered a query or mutation with a failure status
    #[error("Backend rejected the request ({}): {message}", status_label(.status))]
    Backend { status: Option<u16>, message: String },
    /// Transport-level failure talking to the backend
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    /// One or more coverage writes failed. For an existing item the parent
    /// was not saved; a new item was already created as `planning_id`.
    #[error(
        "{failed} of {total} coverage operations failed; {}",
        reconciliation_outcome(.planning_id)
    )]
    Reconciliation {
        failed: usize,
        total: usize,
        planning_id: Option<String>,
        #[source]
        source: Box<PlanningError>,
    },
    /// Record not found for the given ID
    #[error("{kind} with ID {id} not found")]
    NotFound { kind: String, id: String },
    /// Local cache errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

fn reconciliation_outcome(planning_id: &Option<String>) -> String {
    match planning_id {
        Some(id) => format!("planning item {id} was created without them"),
        None => "the planning item was not saved".to_string(),
    }
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "no status".to_string(), |s| format!("status {s}"))
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> PlanningError {
        PlanningError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> PlanningError {
        PlanningError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl PlanningError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Wraps a transport error with a short description of what was attempted.
    pub fn http(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            message: message.into(),
            source,
        }
    }

    /// Whether this failure came from the coverage pass of a save rather
    /// than from the parent item itself.
    pub fn is_reconciliation(&self) -> bool {
        matches!(self, Self::Reconciliation { .. })
    }

    /// HTTP status reported by the backend, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => *status,
            Self::Http { source, .. } => source.status().map(|s| s.as_u16()),
            Self::Reconciliation { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| PlanningError::database(message).with_source(e))
    }
}

/// Result type alias for planning client operations
pub type Result<T> = std::result::Result<T, PlanningError>;
