//! Splits long ID lists into backend-sized batches.
//!
//! The backend caps the number of terms a single query may carry, so a lookup
//! for `N` IDs is issued as `ceil(N / C)` batch requests of at most `C` IDs.
//! Batches run concurrently; their results are concatenated in slice order.

use std::future::Future;

use futures::future::try_join_all;
use log::debug;

use crate::error::Result;

/// Number of batches needed for `len` IDs.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size.max(1))
}

/// Fetches records for `ids` in batches of at most `chunk_size` IDs.
///
/// `fetch_batch` is called once per batch. The first failing batch fails the
/// whole lookup. An empty ID list issues no request.
pub async fn fetch_by_ids<T, F, Fut>(
    ids: &[String],
    chunk_size: usize,
    fetch_batch: F,
) -> Result<Vec<T>>
where
    F: Fn(Vec<String>) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = chunk_size.max(1);
    debug!(
        "Fetching {} ids in {} batch(es)",
        ids.len(),
        chunk_count(ids.len(), chunk_size)
    );

    let batches = ids.chunks(chunk_size).map(|slice| fetch_batch(slice.to_vec()));
    let results = try_join_all(batches).await?;
    Ok(results.into_iter().flatten().collect())
}
