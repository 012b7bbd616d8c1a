use std::fmt::Display;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A strategy for deriving catalog queries from what the user already listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    /// Albums the user's top tracks come from
    TopTracks,
    /// Other albums by artists already in the library
    LibraryArtists,
    /// Albums by artists related to library artists
    RecommendedArtists,
    /// Albums of tracks recommended from top-track seeds
    RecTracksByTopTracks,
    /// Albums of tracks recommended from library-artist seeds
    RecTracksByLibraryArtists,
    /// Albums of tracks recommended from random genre seeds
    RandomGenres,
}

impl Technique {
    /// Every technique that draws from a personal seed pool
    pub const SEEDED: [Technique; 5] = [
        Technique::TopTracks,
        Technique::LibraryArtists,
        Technique::RecommendedArtists,
        Technique::RecTracksByTopTracks,
        Technique::RecTracksByLibraryArtists,
    ];

    pub fn priority_weight(self) -> usize {
        match self {
            Technique::TopTracks => 5,
            Technique::LibraryArtists => 2,
            Technique::RecommendedArtists => 1,
            Technique::RecTracksByTopTracks => 3,
            Technique::RecTracksByLibraryArtists => 3,
            Technique::RandomGenres => 0,
        }
    }
}

impl Display for Technique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Technique::TopTracks => "top_tracks",
            Technique::LibraryArtists => "library_artists",
            Technique::RecommendedArtists => "recommended_artists",
            Technique::RecTracksByTopTracks => "rec_tracks_by_top_tracks",
            Technique::RecTracksByLibraryArtists => "rec_tracks_by_library_artists",
            Technique::RandomGenres => "random_genres",
        };
        write!(f, "{}", name)
    }
}

/// Weighted draw list: each available technique repeated by its weight
///
/// The previous technique is left out unless nothing else is available.
pub fn weighted_pool(available: &[Technique], previous: Option<Technique>) -> Vec<Technique> {
    let others: Vec<Technique> = available
        .iter()
        .copied()
        .filter(|t| Some(*t) != previous)
        .collect();

    let eligible = if others.is_empty() {
        available.to_vec()
    } else {
        others
    };

    eligible
        .into_iter()
        .flat_map(|t| std::iter::repeat(t).take(t.priority_weight()))
        .collect()
}

/// Picks the technique for the next page
///
/// `available` holds the seeded techniques whose pools are not exhausted. Until a
/// session has served a page, recommendations seeded by top tracks are preferred
/// whenever they are available.
pub fn choose_technique<R: Rng + ?Sized>(
    available: &[Technique],
    previous: Option<Technique>,
    first_page: bool,
    rng: &mut R,
) -> Technique {
    if first_page && available.contains(&Technique::RecTracksByTopTracks) {
        return Technique::RecTracksByTopTracks;
    }

    weighted_pool(available, previous)
        .choose(rng)
        .copied()
        .unwrap_or(Technique::RandomGenres)
}
