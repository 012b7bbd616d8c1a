use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod catalog;
pub mod library;
pub mod query;

pub use catalog::{CatalogItem, RecommendationSeeds, TimeRange, TrackRef};
pub use library::{AudioFeatures, FamiliarityRecord, LibraryItem};
pub use query::{Familiarity, MoodQuery};

/// Artist reference shared by library and catalog items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtistRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One item inside a recommendation category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemResult {
    pub item: LibraryItem,
    pub overall_relevance: f64,
    pub matched_dimensions: usize,
}

/// A named group of library items sharing the same matched dimensions
///
/// Across one result set no item appears in more than one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationCategory {
    pub title: String,
    /// Closest match first
    pub items: Vec<ItemResult>,
}

/// Request body shared by the query-based endpoints
#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    #[serde(default)]
    pub query: MoodQuery,
    pub library: Vec<LibraryItem>,
}

// ============================================================================
// Catalog Web API Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiArtist {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl From<ApiArtist> for ArtistRef {
    fn from(artist: ApiArtist) -> Self {
        ArtistRef {
            id: artist.id,
            name: artist.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAlbumRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrack {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub album: Option<ApiAlbumRef>,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
}

impl ApiTrack {
    /// Tracks without an album cannot seed anything
    pub fn into_track_ref(self) -> Option<TrackRef> {
        let album = self.album?;
        Some(TrackRef {
            id: self.id,
            name: self.name,
            album_id: album.id,
            artist_ids: self.artists.into_iter().map(|a| a.id).collect(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTrackPage {
    #[serde(default)]
    pub items: Vec<ApiTrack>,
}

/// Full album object
#[derive(Debug, Clone, Deserialize)]
pub struct ApiAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub tracks: ApiTrackPage,
}

impl From<ApiAlbum> for CatalogItem {
    fn from(album: ApiAlbum) -> Self {
        let total_duration_ms = album.tracks.items.iter().map(|t| t.duration_ms).sum();

        CatalogItem {
            id: album.id,
            name: album.name,
            artists: album.artists.into_iter().map(ArtistRef::from).collect(),
            genres: album.genres.into_iter().collect::<BTreeSet<_>>(),
            total_duration_ms,
            release_date: album.release_date,
        }
    }
}

/// Response from GET /v1/albums?ids=...
#[derive(Debug, Deserialize)]
pub struct ApiAlbumsResponse {
    pub albums: Vec<Option<ApiAlbum>>,
}

/// Response from GET /v1/artists/{id}/albums
#[derive(Debug, Deserialize)]
pub struct ApiArtistAlbumsResponse {
    #[serde(default)]
    pub items: Vec<ApiAlbumRef>,
}

/// Response from GET /v1/artists/{id}/related-artists
#[derive(Debug, Deserialize)]
pub struct ApiRelatedArtistsResponse {
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
}

/// Response from GET /v1/recommendations
#[derive(Debug, Deserialize)]
pub struct ApiRecommendationsResponse {
    #[serde(default)]
    pub tracks: Vec<ApiTrack>,
}

/// Response from GET /v1/recommendations/available-genre-seeds
#[derive(Debug, Deserialize)]
pub struct ApiGenreSeedsResponse {
    #[serde(default)]
    pub genres: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_album_to_catalog_item_sums_durations() {
        let json = r#"{
            "id": "4aawyAB9vmqN3uQ7FjRGTy",
            "name": "Global Warming",
            "artists": [{"id": "0TnOYISbd1XYRBk9myaseg", "name": "Pitbull"}],
            "genres": ["dance pop", "pop"],
            "release_date": "2012-11-16",
            "tracks": {
                "items": [
                    {"id": "t1", "name": "One", "duration_ms": 240000},
                    {"id": "t2", "name": "Two", "duration_ms": 300000}
                ]
            }
        }"#;

        let album: ApiAlbum = serde_json::from_str(json).unwrap();
        let item: CatalogItem = album.into();

        assert_eq!(item.id, "4aawyAB9vmqN3uQ7FjRGTy");
        assert_eq!(item.total_duration_ms, 540000);
        assert_eq!(item.artists[0].name, "Pitbull");
        assert!(item.genres.contains("dance pop"));
        assert_eq!(item.release_date, Some("2012-11-16".to_string()));
    }

    #[test]
    fn test_albums_response_keeps_null_entries() {
        let json = r#"{"albums": [null, {"id": "a", "name": "A"}]}"#;
        let response: ApiAlbumsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.albums.len(), 2);
        assert!(response.albums[0].is_none());
        assert_eq!(response.albums[1].as_ref().unwrap().id, "a");
    }

    #[test]
    fn test_track_without_album_is_dropped() {
        let track = ApiTrack {
            id: "t".to_string(),
            name: "T".to_string(),
            duration_ms: 0,
            album: None,
            artists: vec![],
        };
        assert!(track.into_track_ref().is_none());
    }

    #[test]
    fn test_recommendations_response_to_track_refs() {
        let json = r#"{
            "tracks": [
                {"id": "t1", "name": "One", "album": {"id": "al1"}, "artists": [{"id": "ar1"}]}
            ]
        }"#;
        let response: ApiRecommendationsResponse = serde_json::from_str(json).unwrap();
        let refs: Vec<TrackRef> = response
            .tracks
            .into_iter()
            .filter_map(ApiTrack::into_track_ref)
            .collect();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].album_id, "al1");
        assert_eq!(refs[0].artist_ids, vec!["ar1".to_string()]);
    }
}
