use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{LibraryItem, TimeRange, TrackRef};
use crate::services::providers::CatalogService;

use super::state::ExpansionState;
use super::technique::Technique;

/// Listening data that arrives after a session opens
#[derive(Debug, Default, Clone)]
pub struct SeedInputs {
    top_tracks: Vec<TrackRef>,
    settled_ranges: usize,
}

impl SeedInputs {
    /// Inputs with every range already settled
    pub fn loaded(top_tracks: Vec<TrackRef>) -> Self {
        let mut inputs = Self::default();
        inputs.add_range(top_tracks);
        inputs.settled_ranges = TimeRange::ALL.len();
        inputs
    }

    /// Merges one range's tracks, skipping ids already present
    pub fn add_range(&mut self, tracks: Vec<TrackRef>) {
        let known: HashSet<String> = self.top_tracks.iter().map(|t| t.id.clone()).collect();
        self.top_tracks
            .extend(tracks.into_iter().filter(|t| !known.contains(&t.id)));
        self.settled_ranges += 1;
    }

    pub fn mark_range_failed(&mut self) {
        self.settled_ranges += 1;
    }

    pub fn top_tracks(&self) -> &[TrackRef] {
        &self.top_tracks
    }

    /// Whether every range has either loaded or failed
    pub fn is_settled(&self) -> bool {
        self.settled_ranges >= TimeRange::ALL.len()
    }
}

pub type SharedSeedInputs = Arc<RwLock<SeedInputs>>;

/// Loads every top-track range concurrently into `inputs`
///
/// Returns immediately; each range lands as soon as its call completes. A failed
/// range is logged and contributes nothing.
pub fn spawn_seed_loading(catalog: Arc<dyn CatalogService>, inputs: SharedSeedInputs) {
    for range in TimeRange::ALL {
        let catalog = Arc::clone(&catalog);
        let inputs = Arc::clone(&inputs);

        tokio::spawn(async move {
            match catalog.fetch_top_tracks(range).await {
                Ok(tracks) => {
                    tracing::debug!(%range, tracks = tracks.len(), "Top tracks loaded");
                    inputs.write().await.add_range(tracks);
                }
                Err(e) => {
                    tracing::warn!(%range, error = %e, "Failed to load top tracks");
                    inputs.write().await.mark_range_failed();
                }
            }
        });
    }
}

/// What the seed pools are derived from at one point in time
pub struct SeedSources<'a> {
    pub top_tracks: &'a [TrackRef],
    pub library_ids: &'a HashSet<String>,
    pub library_artists: &'a BTreeSet<String>,
}

/// Distinct artist ids across the library, in id order
pub fn library_artists(library: &[LibraryItem]) -> BTreeSet<String> {
    library
        .iter()
        .flat_map(|item| item.artists.iter().map(|artist| artist.id.clone()))
        .collect()
}

/// Seed ids a technique may still draw from
///
/// The fallback technique has no personal pool and always yields nothing here.
pub fn seed_pool(
    technique: Technique,
    sources: &SeedSources,
    state: &ExpansionState,
) -> Vec<String> {
    let unused = |seed: &String| !state.is_seed_used(technique, seed);

    match technique {
        Technique::TopTracks => {
            let mut albums_seen = HashSet::new();
            sources
                .top_tracks
                .iter()
                .filter(|track| {
                    !state.is_seed_used(technique, &track.id)
                        && !sources.library_ids.contains(&track.album_id)
                        && !state.is_recommended(&track.album_id)
                        && albums_seen.insert(track.album_id.as_str())
                })
                .map(|track| track.id.clone())
                .collect()
        }
        Technique::RecTracksByTopTracks => sources
            .top_tracks
            .iter()
            .map(|track| track.id.clone())
            .filter(unused)
            .collect(),
        Technique::LibraryArtists
        | Technique::RecommendedArtists
        | Technique::RecTracksByLibraryArtists => sources
            .library_artists
            .iter()
            .filter(|id| unused(*id))
            .cloned()
            .collect(),
        Technique::RandomGenres => Vec::new(),
    }
}

/// Seeded techniques whose pools are not exhausted
pub fn available_techniques(sources: &SeedSources, state: &ExpansionState) -> Vec<Technique> {
    Technique::SEEDED
        .into_iter()
        .filter(|technique| !seed_pool(*technique, sources, state).is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::scoring::tests::{features, item};

    pub(crate) fn track(id: &str, album_id: &str, artist_id: &str) -> TrackRef {
        TrackRef {
            id: id.to_string(),
            name: id.to_string(),
            album_id: album_id.to_string(),
            artist_ids: vec![artist_id.to_string()],
        }
    }

    fn artist(id: &str) -> crate::models::ArtistRef {
        crate::models::ArtistRef {
            id: id.to_string(),
            name: String::new(),
        }
    }

    #[test]
    fn test_add_range_skips_duplicates() {
        let mut inputs = SeedInputs::default();
        inputs.add_range(vec![track("t1", "al1", "ar1")]);
        inputs.add_range(vec![track("t1", "al1", "ar1"), track("t2", "al2", "ar1")]);

        assert_eq!(inputs.top_tracks().len(), 2);
        assert!(!inputs.is_settled());

        inputs.mark_range_failed();
        assert!(inputs.is_settled());
    }

    #[test]
    fn test_loaded_inputs_are_settled() {
        let inputs = SeedInputs::loaded(vec![]);
        assert!(inputs.is_settled());
        assert!(inputs.top_tracks().is_empty());
    }

    #[test]
    fn test_library_artists_distinct() {
        let mut a = item("a", &[], features(0.5, 0.5));
        a.artists = vec![artist("ar2"), artist("ar1")];
        let mut b = item("b", &[], features(0.5, 0.5));
        b.artists = vec![artist("ar1")];

        let artists: Vec<String> = library_artists(&[a, b]).into_iter().collect();
        assert_eq!(artists, vec!["ar1".to_string(), "ar2".to_string()]);
    }

    #[test]
    fn test_top_track_pool_skips_owned_and_duplicate_albums() {
        let tracks = vec![
            track("t1", "owned", "ar1"),
            track("t2", "al2", "ar1"),
            track("t3", "al2", "ar1"),
            track("t4", "al4", "ar1"),
        ];
        let library_ids = HashSet::from(["owned".to_string()]);
        let artists = BTreeSet::new();
        let sources = SeedSources {
            top_tracks: &tracks,
            library_ids: &library_ids,
            library_artists: &artists,
        };
        let mut state = ExpansionState::default();
        state.record_page(Technique::TopTracks, vec!["t4".to_string()], vec![]);

        assert_eq!(
            seed_pool(Technique::TopTracks, &sources, &state),
            vec!["t2".to_string()]
        );
        assert_eq!(
            seed_pool(Technique::RecTracksByTopTracks, &sources, &state).len(),
            4
        );
    }

    #[test]
    fn test_exhausted_techniques_are_unavailable() {
        let tracks: Vec<TrackRef> = Vec::new();
        let library_ids = HashSet::new();
        let artists = BTreeSet::from(["ar1".to_string()]);
        let sources = SeedSources {
            top_tracks: &tracks,
            library_ids: &library_ids,
            library_artists: &artists,
        };
        let mut state = ExpansionState::default();
        state.record_page(Technique::LibraryArtists, vec!["ar1".to_string()], vec![]);

        assert_eq!(
            available_techniques(&sources, &state),
            vec![
                Technique::RecommendedArtists,
                Technique::RecTracksByLibraryArtists
            ]
        );
    }
}
