use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::time::Duration;

use super::ArtistRef;

/// A catalog item (album) that can be suggested for the library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    pub total_duration_ms: u64,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl CatalogItem {
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.total_duration_ms)
    }
}

/// Reference to a track, carrying the item it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub album_id: String,
    #[serde(default)]
    pub artist_ids: Vec<String>,
}

/// Seeds for a recommendation-by-seed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationSeeds {
    Tracks(Vec<String>),
    Artists(Vec<String>),
    Genres(Vec<String>),
}

impl RecommendationSeeds {
    /// Query parameter name and comma-joined value
    pub fn as_query_param(&self) -> (&'static str, String) {
        match self {
            RecommendationSeeds::Tracks(ids) => ("seed_tracks", ids.join(",")),
            RecommendationSeeds::Artists(ids) => ("seed_artists", ids.join(",")),
            RecommendationSeeds::Genres(ids) => ("seed_genres", ids.join(",")),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RecommendationSeeds::Tracks(ids)
            | RecommendationSeeds::Artists(ids)
            | RecommendationSeeds::Genres(ids) => ids.is_empty(),
        }
    }
}

/// Window over which a top-tracks list is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [
        TimeRange::ShortTerm,
        TimeRange::MediumTerm,
        TimeRange::LongTerm,
    ];
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRange::ShortTerm => write!(f, "short_term"),
            TimeRange::MediumTerm => write!(f, "medium_term"),
            TimeRange::LongTerm => write!(f, "long_term"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_query_param() {
        let seeds = RecommendationSeeds::Artists(vec!["a1".to_string(), "a2".to_string()]);
        assert_eq!(
            seeds.as_query_param(),
            ("seed_artists", "a1,a2".to_string())
        );
    }

    #[test]
    fn test_time_range_display() {
        assert_eq!(format!("{}", TimeRange::MediumTerm), "medium_term");
    }

    #[test]
    fn test_total_duration() {
        let item = CatalogItem {
            id: "x".to_string(),
            name: "X".to_string(),
            artists: vec![],
            genres: BTreeSet::new(),
            total_duration_ms: 90_000,
            release_date: None,
        };
        assert_eq!(item.total_duration(), Duration::from_secs(90));
    }
}
