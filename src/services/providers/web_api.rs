//! Music catalog Web API provider
//!
//! Talks to a Spotify-style REST API with a bearer token. Albums are the catalog
//! items; artists are the creators.
//!
//! API Flow:
//! 1. Items: /v1/albums?ids=... (up to 20 per call) or /v1/albums/{id}
//! 2. Creators: /v1/artists/{id}/albums → album ids → batch item lookup
//! 3. Related creators: /v1/artists/{id}/related-artists
//! 4. Seeds: /v1/recommendations, /v1/recommendations/available-genre-seeds
//! 5. User listening: /v1/me/top/tracks?time_range=...

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        ApiAlbum, ApiAlbumsResponse, ApiArtistAlbumsResponse, ApiGenreSeedsResponse,
        ApiRecommendationsResponse, ApiRelatedArtistsResponse, ApiTrack, ApiTrackPage,
        CatalogItem, RecommendationSeeds, TimeRange, TrackRef,
    },
    services::providers::CatalogService,
};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;

const ITEM_CACHE_TTL: u64 = 604800; // 1 week
const CREATOR_CACHE_TTL: u64 = 86400; // 1 day
const GENRE_SEEDS_CACHE_TTL: u64 = 604800; // 1 week

/// Most ids the albums endpoint accepts per request
pub const MAX_IDS_PER_REQUEST: usize = 20;

const TOP_TRACKS_LIMIT: &str = "50";
const CREATOR_ALBUMS_LIMIT: &str = "20";

#[derive(Clone)]
pub struct WebCatalogProvider {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
    cache: Cache,
}

impl WebCatalogProvider {
    pub fn new(cache: Cache, access_token: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            access_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let response = self
            .http_client
            .get(self.endpoint(path))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// One albums request for at most `MAX_IDS_PER_REQUEST` ids
    async fn fetch_album_chunk(&self, ids: &[String]) -> AppResult<Vec<Option<CatalogItem>>> {
        let joined = ids.join(",");
        let response: ApiAlbumsResponse = self.get_json("albums", &[("ids", joined.as_str())]).await?;

        let items: Vec<Option<CatalogItem>> = response
            .albums
            .into_iter()
            .map(|album| album.map(CatalogItem::from))
            .collect();

        for item in items.iter().flatten() {
            self.cache
                .set_in_background(&CacheKey::CatalogItem(item.id.clone()), item, ITEM_CACHE_TTL);
        }

        Ok(align_to_ids(ids, items))
    }

    async fn fetch_creator_album_ids(&self, creator_id: &str) -> AppResult<Vec<String>> {
        let path = format!("artists/{}/albums", creator_id);
        let response: ApiArtistAlbumsResponse = self
            .get_json(
                &path,
                &[("include_groups", "album"), ("limit", CREATOR_ALBUMS_LIMIT)],
            )
            .await?;

        Ok(response.items.into_iter().map(|album| album.id).collect())
    }

    /// A creator's items, and whether every listed album could be fetched
    async fn load_creator_items(&self, creator_id: &str) -> AppResult<(Vec<CatalogItem>, bool)> {
        let album_ids = self.fetch_creator_album_ids(creator_id).await?;
        let results = self.fetch_batch(album_ids).await?;
        let complete = results.iter().all(Option::is_some);
        Ok((results.into_iter().flatten().collect(), complete))
    }
}

async fn check_status(response: Response) -> AppResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::ExternalApi(format!(
        "Catalog API returned status {}: {}",
        status, body
    )))
}

/// Pads or truncates a batch response so it lines up with the requested ids
fn align_to_ids(ids: &[String], mut items: Vec<Option<CatalogItem>>) -> Vec<Option<CatalogItem>> {
    if items.len() != ids.len() {
        tracing::warn!(
            requested = ids.len(),
            returned = items.len(),
            "Catalog batch response length mismatch"
        );
    }
    items.resize(ids.len(), None);
    items
}

fn track_refs(tracks: Vec<ApiTrack>) -> Vec<TrackRef> {
    tracks
        .into_iter()
        .filter_map(ApiTrack::into_track_ref)
        .collect()
}

#[async_trait::async_trait]
impl CatalogService for WebCatalogProvider {
    async fn fetch_by_id(&self, id: &str) -> AppResult<CatalogItem> {
        if id.trim().is_empty() {
            return Err(AppError::InvalidInput("Item id cannot be empty".to_string()));
        }

        cached!(
            self.cache,
            CacheKey::CatalogItem(id.to_string()),
            ITEM_CACHE_TTL,
            async move {
                let album: ApiAlbum = self.get_json(&format!("albums/{}", id), &[]).await?;
                Ok::<_, AppError>(CatalogItem::from(album))
            }
        )
    }

    async fn fetch_batch(&self, ids: Vec<String>) -> AppResult<Vec<Option<CatalogItem>>> {
        let mut results = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            match self.fetch_album_chunk(chunk).await {
                Ok(items) => results.extend(items),
                Err(e) => {
                    tracing::warn!(
                        chunk_size = chunk.len(),
                        error = %e,
                        provider = self.name(),
                        "Catalog batch chunk failed, skipping"
                    );
                    results.extend(std::iter::repeat_with(|| None).take(chunk.len()));
                }
            }
        }

        tracing::debug!(
            requested = ids.len(),
            found = results.iter().filter(|r| r.is_some()).count(),
            "Catalog batch fetched"
        );

        Ok(results)
    }

    async fn fetch_related_ids(&self, creator_id: &str) -> AppResult<Vec<String>> {
        cached!(
            self.cache,
            CacheKey::RelatedCreators(creator_id.to_string()),
            CREATOR_CACHE_TTL,
            async move {
                let path = format!("artists/{}/related-artists", creator_id);
                let response: ApiRelatedArtistsResponse = self.get_json(&path, &[]).await?;
                Ok::<_, AppError>(
                    response
                        .artists
                        .into_iter()
                        .map(|artist| artist.id)
                        .collect::<Vec<String>>(),
                )
            }
        )
    }

    async fn fetch_catalog_items_for_creator(
        &self,
        creator_id: &str,
    ) -> AppResult<Vec<CatalogItem>> {
        let key = CacheKey::CreatorItems(creator_id.to_string());
        if let Some(hit) = self.cache.lookup(&key).await {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(hit);
        }

        let (items, complete) = self.load_creator_items(creator_id).await?;
        if complete {
            self.cache.set_in_background(&key, &items, CREATOR_CACHE_TTL);
        } else {
            tracing::debug!(
                creator_id,
                items = items.len(),
                "Creator items incomplete, not caching"
            );
        }
        Ok(items)
    }

    async fn fetch_recommendations_by_seed(
        &self,
        seeds: RecommendationSeeds,
        limit: usize,
    ) -> AppResult<Vec<TrackRef>> {
        if seeds.is_empty() {
            return Ok(Vec::new());
        }

        let (param, value) = seeds.as_query_param();
        let limit = limit.to_string();
        let response: ApiRecommendationsResponse = self
            .get_json("recommendations", &[(param, value.as_str()), ("limit", limit.as_str())])
            .await?;

        let tracks = track_refs(response.tracks);
        tracing::debug!(param, seeds = %value, tracks = tracks.len(), "Recommendations fetched");
        Ok(tracks)
    }

    async fn fetch_available_genre_seeds(&self) -> AppResult<Vec<String>> {
        cached!(
            self.cache,
            CacheKey::GenreSeeds,
            GENRE_SEEDS_CACHE_TTL,
            async move {
                let response: ApiGenreSeedsResponse = self
                    .get_json("recommendations/available-genre-seeds", &[])
                    .await?;
                Ok::<_, AppError>(response.genres)
            }
        )
    }

    async fn fetch_top_tracks(&self, range: TimeRange) -> AppResult<Vec<TrackRef>> {
        let range_param = range.to_string();
        let page: ApiTrackPage = self
            .get_json(
                "me/top/tracks",
                &[("time_range", range_param.as_str()), ("limit", TOP_TRACKS_LIMIT)],
            )
            .await?;

        Ok(track_refs(page.items))
    }

    fn clone_for_task(&self) -> Box<dyn CatalogService> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "web_api"
    }
}
