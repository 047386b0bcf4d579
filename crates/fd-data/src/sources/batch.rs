//! Batched time-series fetches
//!
//! Charts comparing several entities (companies, auction terms, states)
//! need one series per entity. They are requested together in a single
//! call instead of one request per entity.

use ahash::AHashSet;
use indexmap::IndexMap;
use fd_core::Dataset;

use super::DataApi;

/// Fetch the time series of every entity in `entities` with one request.
///
/// Duplicates are dropped while keeping first-seen order. Entities the
/// backend has no data for come back as empty datasets.
pub async fn fetch_time_series<S: AsRef<str>>(
    api: &dyn DataApi,
    entities: &[S],
) -> anyhow::Result<IndexMap<String, Dataset>> {
    let mut seen = AHashSet::new();
    let unique: Vec<String> = entities
        .iter()
        .map(|e| e.as_ref().to_string())
        .filter(|e| seen.insert(e.clone()))
        .collect();

    if unique.is_empty() {
        return Ok(IndexMap::new());
    }

    tracing::debug!("Fetching {} time series in one request", unique.len());
    let mut batch = api.time_series_batch(&unique).await?;

    Ok(unique
        .into_iter()
        .map(|entity| {
            let rows = batch.swap_remove(&entity).unwrap_or_else(|| {
                tracing::warn!("No time series returned for {}", entity);
                Vec::new()
            });
            (entity, Dataset::new(rows))
        })
        .collect())
}
