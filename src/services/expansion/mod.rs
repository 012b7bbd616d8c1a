//! Library expansion recommender
//!
//! A session hands out successive pages of catalog items the user does not own yet.
//! Each page comes from one seeding technique, picked by weight, never the same as
//! the previous page's unless nothing else is left. Nothing is suggested twice
//! within a session, or across sessions when a history is supplied.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::models::{CatalogItem, LibraryItem, RecommendationSeeds, TrackRef};
use crate::services::providers::{fan_out, CatalogService};

pub mod seeds;
pub mod state;
pub mod technique;

pub use seeds::{SeedInputs, SharedSeedInputs};
pub use state::ExpansionState;
pub use technique::Technique;

use seeds::{available_techniques, library_artists, seed_pool, spawn_seed_loading, SeedSources};
use technique::choose_technique;

/// Most seeds one recommendations call accepts
const MAX_SEEDS_PER_REQUEST: usize = 5;
/// Most creators looked up for one page
const MAX_CREATOR_SEEDS: usize = 5;
/// Most items one creator contributes to a page
const MAX_ITEMS_PER_CREATOR: usize = 4;
/// Consecutive empty pages after which a technique is set aside for the session
const MAX_CONSECUTIVE_FAILURES: usize = 3;

/// Tunables for expansion sessions
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionSettings {
    /// Items shorter than this are treated as singles and skipped
    pub min_item_duration: Duration,
    pub seed_batch_size: usize,
    /// Tracks requested per recommendations call
    pub recommendation_limit: usize,
    pub readiness_poll_interval: Duration,
    pub readiness_timeout: Duration,
    /// Sessions untouched for this long are dropped
    pub session_idle_timeout: Duration,
}

impl Default for ExpansionSettings {
    fn default() -> Self {
        Self {
            min_item_duration: Duration::from_secs(15 * 60),
            seed_batch_size: 10,
            recommendation_limit: 15,
            readiness_poll_interval: Duration::from_millis(250),
            readiness_timeout: Duration::from_millis(3000),
            session_idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// One page of new items
#[derive(Debug, Clone, Serialize)]
pub struct ExpansionPage {
    pub technique: Technique,
    pub items: Vec<CatalogItem>,
}

pub struct ExpansionSession {
    catalog: Arc<dyn CatalogService>,
    library_ids: HashSet<String>,
    library_artists: BTreeSet<String>,
    seed_inputs: SharedSeedInputs,
    state: ExpansionState,
    settings: ExpansionSettings,
    rng: StdRng,
    pages_served: usize,
    failure_streaks: HashMap<Technique, usize>,
    readiness_checked: bool,
    created_at: DateTime<Utc>,
}

impl ExpansionSession {
    /// Opens a session and starts loading the user's top tracks in the background
    pub fn open(
        catalog: Arc<dyn CatalogService>,
        library: &[LibraryItem],
        previously_recommended: HashSet<String>,
        settings: ExpansionSettings,
    ) -> Self {
        let seed_inputs: SharedSeedInputs = Arc::new(RwLock::new(SeedInputs::default()));
        spawn_seed_loading(Arc::clone(&catalog), Arc::clone(&seed_inputs));

        Self::new(
            catalog,
            library,
            seed_inputs,
            previously_recommended,
            settings,
            StdRng::from_os_rng(),
        )
    }

    pub fn new(
        catalog: Arc<dyn CatalogService>,
        library: &[LibraryItem],
        seed_inputs: SharedSeedInputs,
        previously_recommended: HashSet<String>,
        settings: ExpansionSettings,
        rng: StdRng,
    ) -> Self {
        Self {
            catalog,
            library_ids: library.iter().map(|item| item.id.clone()).collect(),
            library_artists: library_artists(library),
            seed_inputs,
            state: ExpansionState::with_history(previously_recommended),
            settings,
            rng,
            pages_served: 0,
            failure_streaks: HashMap::new(),
            readiness_checked: false,
            created_at: Utc::now(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn pages_served(&self) -> usize {
        self.pages_served
    }

    pub fn state(&self) -> &ExpansionState {
        &self.state
    }

    /// Whether `technique` failed often enough in a row to be skipped
    pub fn is_set_aside(&self, technique: Technique) -> bool {
        self.failure_streaks.get(&technique).copied().unwrap_or(0) >= MAX_CONSECUTIVE_FAILURES
    }

    /// Produces the next page, or `None` when the chosen technique found nothing new
    ///
    /// The exclusion state only changes when a page is returned, so a failed page
    /// can simply be retried. A seeded technique that comes up empty
    /// `MAX_CONSECUTIVE_FAILURES` times in a row is no longer drawn. Calls for one
    /// session must not overlap.
    pub async fn recommend_next_page(&mut self) -> Option<ExpansionPage> {
        if !self.readiness_checked {
            self.wait_for_seeds().await;
            self.readiness_checked = true;
        }

        let top_tracks = self.seed_inputs.read().await.top_tracks().to_vec();
        let (technique, pool) = {
            let sources = SeedSources {
                top_tracks: &top_tracks,
                library_ids: &self.library_ids,
                library_artists: &self.library_artists,
            };
            let mut available = available_techniques(&sources, &self.state);
            available.retain(|technique| !self.is_set_aside(*technique));
            let technique = choose_technique(
                &available,
                self.state.last_technique(),
                self.pages_served == 0,
                &mut self.rng,
            );
            (technique, seed_pool(technique, &sources, &self.state))
        };

        tracing::debug!(%technique, pool = pool.len(), "Technique chosen");

        let (seeds, raw_items) = self.execute(technique, &pool, &top_tracks).await;
        let raw_count = raw_items.len();
        let items = self.keep_new(raw_items);

        if items.is_empty() {
            let streak = self.failure_streaks.entry(technique).or_insert(0);
            *streak += 1;
            tracing::warn!(
                %technique,
                seeds = seeds.len(),
                fetched = raw_count,
                consecutive_failures = *streak,
                "Expansion page produced no new items"
            );
            return None;
        }

        self.failure_streaks.remove(&technique);

        self.state.record_page(
            technique,
            seeds,
            items.iter().map(|item| item.id.clone()),
        );
        self.pages_served += 1;

        tracing::info!(
            %technique,
            items = items.len(),
            page = self.pages_served,
            recommended_total = self.state.recommended_count(),
            "Expansion page served"
        );

        Some(ExpansionPage { technique, items })
    }

    /// Waits until some seed pool fills, the inputs settle, or the timeout passes
    async fn wait_for_seeds(&self) {
        let started = Instant::now();

        loop {
            {
                let inputs = self.seed_inputs.read().await;
                let sources = SeedSources {
                    top_tracks: inputs.top_tracks(),
                    library_ids: &self.library_ids,
                    library_artists: &self.library_artists,
                };
                if inputs.is_settled() || !available_techniques(&sources, &self.state).is_empty()
                {
                    return;
                }
            }

            if started.elapsed() >= self.settings.readiness_timeout {
                tracing::warn!(
                    waited_ms = started.elapsed().as_millis() as u64,
                    "Seed inputs not ready, continuing with what is loaded"
                );
                return;
            }

            tokio::time::sleep(self.settings.readiness_poll_interval).await;
        }
    }

    /// Runs one technique, returning the seeds it consumed and everything it fetched
    async fn execute(
        &mut self,
        technique: Technique,
        pool: &[String],
        top_tracks: &[TrackRef],
    ) -> (Vec<String>, Vec<CatalogItem>) {
        let creator_count = self.settings.seed_batch_size.min(MAX_CREATOR_SEEDS);

        match technique {
            Technique::TopTracks => {
                let seeds = sample(pool, self.settings.seed_batch_size, &mut self.rng);
                let album_ids = unique(seeds.iter().filter_map(|seed| {
                    top_tracks
                        .iter()
                        .find(|track| &track.id == seed)
                        .map(|track| track.album_id.clone())
                }));
                let items = self.fetch_items(album_ids).await;
                (seeds, items)
            }
            Technique::LibraryArtists => {
                let seeds = sample(pool, creator_count, &mut self.rng);
                let items = self.creator_items(seeds.clone()).await;
                (seeds, items)
            }
            Technique::RecommendedArtists => {
                let seeds = sample(pool, creator_count, &mut self.rng);
                let related = self.related_creators(seeds.clone()).await;
                let creators = sample(&related, creator_count, &mut self.rng);
                let items = self.creator_items(creators).await;
                (seeds, items)
            }
            Technique::RecTracksByTopTracks => {
                let seeds = sample(pool, MAX_SEEDS_PER_REQUEST, &mut self.rng);
                let items = self
                    .recommended_items(RecommendationSeeds::Tracks(seeds.clone()))
                    .await;
                (seeds, items)
            }
            Technique::RecTracksByLibraryArtists => {
                let seeds = sample(pool, MAX_SEEDS_PER_REQUEST, &mut self.rng);
                let items = self
                    .recommended_items(RecommendationSeeds::Artists(seeds.clone()))
                    .await;
                (seeds, items)
            }
            Technique::RandomGenres => {
                let genres = match self.catalog.fetch_available_genre_seeds().await {
                    Ok(genres) => genres,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to fetch genre seeds");
                        return (Vec::new(), Vec::new());
                    }
                };
                let seeds = sample(&genres, MAX_SEEDS_PER_REQUEST, &mut self.rng);
                let items = self
                    .recommended_items(RecommendationSeeds::Genres(seeds.clone()))
                    .await;
                (seeds, items)
            }
        }
    }

    async fn fetch_items(&self, ids: Vec<String>) -> Vec<CatalogItem> {
        if ids.is_empty() {
            return Vec::new();
        }

        match self.catalog.fetch_batch(ids).await {
            Ok(items) => items.into_iter().flatten().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Catalog batch fetch failed");
                Vec::new()
            }
        }
    }

    /// Items from each creator, at most `MAX_ITEMS_PER_CREATOR` new ones apiece
    async fn creator_items(&self, creators: Vec<String>) -> Vec<CatalogItem> {
        let catalog = Arc::clone(&self.catalog);
        let per_creator = fan_out(creators, move |creator: String| {
            let catalog = Arc::clone(&catalog);
            async move { catalog.fetch_catalog_items_for_creator(&creator).await }
        })
        .await;

        per_creator
            .into_iter()
            .flatten()
            .flat_map(|items| {
                items
                    .into_iter()
                    .filter(move |item| self.is_new(item))
                    .take(MAX_ITEMS_PER_CREATOR)
            })
            .collect()
    }

    /// Creators related to any of `creators` that are not in the library
    async fn related_creators(&self, creators: Vec<String>) -> Vec<String> {
        let catalog = Arc::clone(&self.catalog);
        let related = fan_out(creators, move |creator: String| {
            let catalog = Arc::clone(&catalog);
            async move { catalog.fetch_related_ids(&creator).await }
        })
        .await;

        unique(
            related
                .into_iter()
                .flatten()
                .flatten()
                .filter(|id| !self.library_artists.contains(id)),
        )
    }

    async fn recommended_items(&self, seeds: RecommendationSeeds) -> Vec<CatalogItem> {
        if seeds.is_empty() {
            return Vec::new();
        }

        let tracks = match self
            .catalog
            .fetch_recommendations_by_seed(seeds, self.settings.recommendation_limit)
            .await
        {
            Ok(tracks) => tracks,
            Err(e) => {
                tracing::warn!(error = %e, "Recommendations by seed failed");
                return Vec::new();
            }
        };

        let album_ids = unique(
            tracks
                .into_iter()
                .map(|track| track.album_id)
                .filter(|id| !self.library_ids.contains(id) && !self.state.is_recommended(id)),
        );
        self.fetch_items(album_ids).await
    }

    fn is_new(&self, item: &CatalogItem) -> bool {
        !self.library_ids.contains(&item.id)
            && !self.state.is_recommended(&item.id)
            && item.total_duration() >= self.settings.min_item_duration
    }

    /// Drops owned, already suggested, short and duplicate items
    fn keep_new(&self, items: Vec<CatalogItem>) -> Vec<CatalogItem> {
        let mut seen = HashSet::new();
        items
            .into_iter()
            .filter(|item| self.is_new(item) && seen.insert(item.id.clone()))
            .collect()
    }
}

/// Up to `count` distinct entries of `pool`, in random order
fn sample<R: Rng + ?Sized>(pool: &[String], count: usize, rng: &mut R) -> Vec<String> {
    pool.choose_multiple(rng, count).cloned().collect()
}

/// Deduplicates while keeping first-seen order
fn unique(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
