//! Translation of search parameters into backend query documents.
//!
//! Every builder in this module is a pure function: it takes borrowed
//! parameters plus a [`QueryContext`] and returns a freshly built query. No
//! builder can fail; an absent filter simply contributes no clause.
//!
//! - [`planning`]: planning-item queries, including lookups by event IDs
//! - [`events`]: event criteria and lookups by event ID
//! - [`combined`]: the federated events-and-planning query
//! - [`clause`]: the clause constructors shared by the builders

pub mod clause;
pub mod combined;
pub mod events;
pub mod planning;

use jiff::{Timestamp, tz::Offset, tz::TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of IDs sent in one lookup request.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Session facts the builders depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    /// Largest ID list a single request may carry
    pub chunk_size: usize,
    /// UTC offset of the session, formatted `+HH:MM`
    pub time_zone_offset: String,
}

impl QueryContext {
    /// Builds a context for the offset `time_zone` has at `now`.
    pub fn new(chunk_size: usize, time_zone: &TimeZone, now: Timestamp) -> Self {
        Self::with_offset(chunk_size, time_zone.to_offset(now))
    }

    pub fn with_offset(chunk_size: usize, offset: Offset) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            time_zone_offset: format_offset(offset),
        }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::with_offset(DEFAULT_CHUNK_SIZE, Offset::UTC)
    }
}

/// Formats an offset the way the backend's `time_zone` parameter expects.
pub fn format_offset(offset: Offset) -> String {
    let seconds = offset.seconds();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

/// The `source` document of a search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    pub sort: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,
}

impl SearchQuery {
    pub fn new(query: Value, sort: Vec<Value>) -> Self {
        Self {
            query,
            filter: None,
            sort,
            size: None,
            from: None,
        }
    }
}

/// A complete request for one page of a search endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub source: SearchQuery,
    /// Page number for endpoints that paginate outside the source document
    pub page: Option<u32>,
    pub max_results: Option<u32>,
}

/// Outcome of building a planning query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    Search(SearchRequest),
    /// The event ID list exceeds the chunk size and must be split into
    /// several requests
    MustChunk,
}
