//! Batched lookups of records by ID.

pub mod chunked;

pub use chunked::{chunk_count, fetch_by_ids};
