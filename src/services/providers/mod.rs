//! Catalog service abstraction
//!
//! The expansion recommender talks to the external catalog only through this trait,
//! so the HTTP provider can be swapped for an in-memory one in tests. Every call may
//! fail on its own; callers degrade a failure to "no contribution".

use std::future::Future;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogItem, RecommendationSeeds, TimeRange, TrackRef},
};

pub mod web_api;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetch a single catalog item by id
    async fn fetch_by_id(&self, id: &str) -> AppResult<CatalogItem>;

    /// Fetch several items at once, `None` for every id that could not be fetched
    ///
    /// Default implementation calls fetch_by_id for each ID in parallel.
    /// Providers can override for bulk API endpoints if available.
    async fn fetch_batch(&self, ids: Vec<String>) -> AppResult<Vec<Option<CatalogItem>>> {
        let results = fan_out(ids, |id| {
            let provider = self.clone_for_task();
            async move { provider.fetch_by_id(&id).await }
        })
        .await;

        let error_count = results.iter().filter(|r| r.is_none()).count();
        if error_count > 0 {
            tracing::warn!(
                success_count = results.len() - error_count,
                error_count,
                provider = self.name(),
                "Partial catalog batch failure"
            );
        }

        Ok(results)
    }

    /// Ids of creators related to the given creator
    async fn fetch_related_ids(&self, creator_id: &str) -> AppResult<Vec<String>>;

    /// Catalog items released by a creator
    async fn fetch_catalog_items_for_creator(&self, creator_id: &str)
        -> AppResult<Vec<CatalogItem>>;

    /// Tracks recommended from a set of seeds
    async fn fetch_recommendations_by_seed(
        &self,
        seeds: RecommendationSeeds,
        limit: usize,
    ) -> AppResult<Vec<TrackRef>>;

    /// Genres accepted as recommendation seeds
    async fn fetch_available_genre_seeds(&self) -> AppResult<Vec<String>>;

    /// The user's most played tracks over a time range
    async fn fetch_top_tracks(&self, range: TimeRange) -> AppResult<Vec<TrackRef>>;

    /// Clone provider for parallel task execution
    ///
    /// Required because providers need to be moved into tokio tasks.
    fn clone_for_task(&self) -> Box<dyn CatalogService>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Runs one catalog call per key concurrently and waits for all of them
///
/// A failed call, or a task that panicked, contributes `None` in its slot; the group
/// as a whole never fails.
pub async fn fan_out<K, T, F, Fut>(keys: Vec<K>, call: F) -> Vec<Option<T>>
where
    K: std::fmt::Display + Send + 'static,
    T: Send + 'static,
    F: Fn(K) -> Fut,
    Fut: Future<Output = AppResult<T>> + Send + 'static,
{
    let tasks: Vec<_> = keys
        .into_iter()
        .map(|key| {
            let label = key.to_string();
            (label, tokio::spawn(call(key)))
        })
        .collect();

    let mut results = Vec::with_capacity(tasks.len());

    for (label, task) in tasks {
        let outcome = match task.await {
            Ok(result) => result,
            Err(e) => Err(AppError::Internal(e.to_string())),
        };

        match outcome {
            Ok(value) => results.push(Some(value)),
            Err(e) => {
                tracing::warn!(key = %label, error = %e, "Catalog call failed, skipping");
                results.push(None);
            }
        }
    }

    results
}
