use std::collections::BTreeSet;
use std::fmt::Display;

use crate::models::{Familiarity, FamiliarityRecord, LibraryItem, MoodQuery};

/// Minimum closeness for a spectrum dimension to count as matched
pub const SPECTRUM_RELEVANCE_THRESHOLD: f64 = 0.7;

/// Continuous dimensions an item can be scored on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpectrumDimension {
    Acousticness,
    Valence,
    Energy,
    Danceability,
    Instrumentalness,
}

impl SpectrumDimension {
    /// (high, low) adjective pair
    fn labels(&self) -> (&'static str, &'static str) {
        match self {
            SpectrumDimension::Acousticness => ("Acoustic", "Electric"),
            SpectrumDimension::Valence => ("Happy", "Melancholy"),
            SpectrumDimension::Energy => ("Energetic", "Chill"),
            SpectrumDimension::Danceability => ("Danceable", "Laid-Back"),
            SpectrumDimension::Instrumentalness => ("Instrumental", "Vocal"),
        }
    }

    fn value(&self, item: &LibraryItem) -> f64 {
        let features = &item.features;
        match self {
            SpectrumDimension::Acousticness => features.acousticness,
            SpectrumDimension::Valence => features.valence,
            SpectrumDimension::Energy => features.energy,
            SpectrumDimension::Danceability => features.danceability,
            SpectrumDimension::Instrumentalness => features.instrumentalness,
        }
    }
}

/// Label earned by matching a spectrum dimension on one of its two sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Adjective {
    pub dimension: SpectrumDimension,
    pub high: bool,
}

impl Display for Adjective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (high, low) = self.dimension.labels();
        write!(f, "{}", if self.high { high } else { low })
    }
}

/// One scored dimension of match between an item and a query
#[derive(Debug, Clone, PartialEq)]
pub enum RelevanceParameter {
    Spectrum {
        dimension: SpectrumDimension,
        preferred: f64,
        score: f64,
    },
    Familiarity {
        familiarity: Familiarity,
        matched: bool,
    },
    Genre {
        matched: BTreeSet<String>,
    },
}

impl RelevanceParameter {
    pub fn score(&self) -> f64 {
        match self {
            RelevanceParameter::Spectrum { score, .. } => *score,
            RelevanceParameter::Familiarity { matched, .. } => bool_score(*matched),
            RelevanceParameter::Genre { matched } => bool_score(!matched.is_empty()),
        }
    }

    pub fn is_relevant(&self) -> bool {
        match self {
            RelevanceParameter::Spectrum { score, .. } => *score > SPECTRUM_RELEVANCE_THRESHOLD,
            RelevanceParameter::Familiarity { matched, .. } => *matched,
            RelevanceParameter::Genre { matched } => !matched.is_empty(),
        }
    }

    /// Adjective for a spectrum parameter, on the side the query asked for
    pub fn adjective(&self) -> Option<Adjective> {
        match self {
            RelevanceParameter::Spectrum {
                dimension,
                preferred,
                ..
            } => Some(Adjective {
                dimension: *dimension,
                high: *preferred >= 0.5,
            }),
            _ => None,
        }
    }
}

fn bool_score(matched: bool) -> f64 {
    if matched {
        1.0
    } else {
        0.0
    }
}

/// A library item paired with its relevance parameters for one query
#[derive(Debug, Clone)]
pub struct ScoredItem<'a> {
    pub item: &'a LibraryItem,
    pub parameters: Vec<RelevanceParameter>,
}

impl<'a> ScoredItem<'a> {
    pub fn matched_parameters(&self) -> impl Iterator<Item = &RelevanceParameter> {
        self.parameters.iter().filter(|p| p.is_relevant())
    }

    pub fn matched_count(&self) -> usize {
        self.matched_parameters().count()
    }

    /// Mean of all parameter scores, 1.0 when the query set no dimension
    pub fn overall_relevance(&self) -> f64 {
        if self.parameters.is_empty() {
            return 1.0;
        }
        let total: f64 = self.parameters.iter().map(RelevanceParameter::score).sum();
        total / self.parameters.len() as f64
    }

    /// Share of query dimensions matched, 1.0 when the query set no dimension
    pub fn matched_fraction(&self) -> f64 {
        if self.parameters.is_empty() {
            return 1.0;
        }
        self.matched_count() as f64 / self.parameters.len() as f64
    }

    pub fn fully_relevant(&self) -> bool {
        self.parameters.iter().all(RelevanceParameter::is_relevant)
    }

    pub fn partially_relevant(&self) -> bool {
        self.parameters.is_empty() || self.parameters.iter().any(RelevanceParameter::is_relevant)
    }
}

/// Scores one item against a query, producing exactly one parameter per set dimension
pub fn score_item<'a>(item: &'a LibraryItem, query: &MoodQuery) -> ScoredItem<'a> {
    let mut parameters = Vec::with_capacity(query.dimension_count());

    let spectrum = [
        (SpectrumDimension::Acousticness, query.acousticness),
        (SpectrumDimension::Valence, query.valence),
        (SpectrumDimension::Energy, query.energy),
        (SpectrumDimension::Danceability, query.danceability),
        (
            SpectrumDimension::Instrumentalness,
            query.instrumental.map(bool_score),
        ),
    ];

    for (dimension, preferred) in spectrum {
        if let Some(preferred) = preferred {
            parameters.push(RelevanceParameter::Spectrum {
                dimension,
                preferred,
                score: closeness(preferred, dimension.value(item)),
            });
        }
    }

    if let Some(familiarity) = query.familiarity {
        parameters.push(RelevanceParameter::Familiarity {
            familiarity,
            matched: familiarity_matches(familiarity, &item.familiarity),
        });
    }

    if let Some(genres) = query.genre_preference() {
        parameters.push(RelevanceParameter::Genre {
            matched: item.genres.intersection(genres).cloned().collect(),
        });
    }

    ScoredItem { item, parameters }
}

/// Symmetric closeness of two values in [0, 1]
fn closeness(preferred: f64, actual: f64) -> f64 {
    (1.0 - (preferred - actual).abs()).clamp(0.0, 1.0)
}

fn familiarity_matches(familiarity: Familiarity, record: &FamiliarityRecord) -> bool {
    match familiarity {
        Familiarity::CurrentFavorite => {
            record.recently_played || record.short_term_favorite || record.medium_term_favorite
        }
        Familiarity::ReliableClassic => record.long_term_favorite,
        Familiarity::UnderappreciatedGem => record.is_low(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::AudioFeatures;

    pub(crate) fn item(id: &str, genres: &[&str], features: AudioFeatures) -> LibraryItem {
        LibraryItem {
            id: id.to_string(),
            name: id.to_uppercase(),
            artists: vec![],
            genres: genres.iter().map(|g| g.to_string()).collect(),
            features,
            familiarity: FamiliarityRecord::default(),
        }
    }

    pub(crate) fn features(acousticness: f64, danceability: f64) -> AudioFeatures {
        AudioFeatures {
            acousticness,
            valence: 0.5,
            energy: 0.5,
            danceability,
            instrumentalness: 0.0,
        }
    }

    #[test]
    fn test_one_parameter_per_set_dimension() {
        let album = item("a", &["rock"], features(0.9, 0.2));
        let query = MoodQuery {
            acousticness: Some(1.0),
            energy: Some(0.3),
            familiarity: Some(Familiarity::UnderappreciatedGem),
            genres: Some(BTreeSet::from(["rock".to_string()])),
            ..Default::default()
        };

        let scored = score_item(&album, &query);
        assert_eq!(scored.parameters.len(), 4);
    }

    #[test]
    fn test_spectrum_closeness() {
        let album = item("a", &[], features(0.9, 0.2));
        let query = MoodQuery {
            acousticness: Some(1.0),
            danceability: Some(1.0),
            ..Default::default()
        };

        let scored = score_item(&album, &query);
        assert!((scored.parameters[0].score() - 0.9).abs() < 1e-9);
        assert!(scored.parameters[0].is_relevant());
        assert!((scored.parameters[1].score() - 0.2).abs() < 1e-9);
        assert!(!scored.parameters[1].is_relevant());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let album = item("a", &[], features(0.3, 0.5));
        let query = MoodQuery {
            acousticness: Some(0.0),
            ..Default::default()
        };
        let scored = score_item(&album, &query);
        assert_eq!(scored.parameters[0].score(), SPECTRUM_RELEVANCE_THRESHOLD);
        assert!(!scored.parameters[0].is_relevant());
    }

    #[test]
    fn test_instrumental_preference() {
        let mut album = item("a", &[], features(0.5, 0.5));
        album.features.instrumentalness = 0.8;

        let instrumental = MoodQuery {
            instrumental: Some(true),
            ..Default::default()
        };
        let vocal = MoodQuery {
            instrumental: Some(false),
            ..Default::default()
        };

        assert!((score_item(&album, &instrumental).parameters[0].score() - 0.8).abs() < 1e-9);
        assert!((score_item(&album, &vocal).parameters[0].score() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_familiarity_rules() {
        let mut album = item("a", &[], features(0.5, 0.5));
        let query = |familiarity| MoodQuery {
            familiarity: Some(familiarity),
            ..Default::default()
        };

        assert!(score_item(&album, &query(Familiarity::UnderappreciatedGem)).fully_relevant());
        assert!(!score_item(&album, &query(Familiarity::CurrentFavorite)).fully_relevant());

        album.familiarity.medium_term_favorite = true;
        assert!(score_item(&album, &query(Familiarity::CurrentFavorite)).fully_relevant());
        assert!(!score_item(&album, &query(Familiarity::ReliableClassic)).fully_relevant());
        assert!(!score_item(&album, &query(Familiarity::UnderappreciatedGem)).fully_relevant());

        album.familiarity.long_term_favorite = true;
        assert!(score_item(&album, &query(Familiarity::ReliableClassic)).fully_relevant());
    }

    #[test]
    fn test_genre_intersection() {
        let album = item("a", &["rock", "indie rock", "folk"], features(0.5, 0.5));
        let query = MoodQuery {
            genres: Some(BTreeSet::from(["folk".to_string(), "jazz".to_string()])),
            ..Default::default()
        };

        let scored = score_item(&album, &query);
        match &scored.parameters[0] {
            RelevanceParameter::Genre { matched } => {
                assert_eq!(matched, &BTreeSet::from(["folk".to_string()]));
            }
            other => panic!("unexpected parameter {:?}", other),
        }
        assert_eq!(scored.overall_relevance(), 1.0);
    }

    #[test]
    fn test_zero_dimensions_is_fully_relevant() {
        let album = item("a", &[], features(0.5, 0.5));
        let scored = score_item(&album, &MoodQuery::default());

        assert!(scored.parameters.is_empty());
        assert_eq!(scored.overall_relevance(), 1.0);
        assert_eq!(scored.matched_fraction(), 1.0);
        assert!(scored.fully_relevant());
        assert!(scored.partially_relevant());
    }

    #[test]
    fn test_overall_relevance_stays_in_unit_range() {
        let album = item("a", &["pop"], features(1.0, 0.0));
        let queries = [
            MoodQuery {
                acousticness: Some(0.0),
                danceability: Some(1.0),
                genres: Some(BTreeSet::from(["metal".to_string()])),
                ..Default::default()
            },
            MoodQuery {
                acousticness: Some(1.0),
                danceability: Some(0.0),
                genres: Some(BTreeSet::from(["pop".to_string()])),
                ..Default::default()
            },
        ];

        let low = score_item(&album, &queries[0]).overall_relevance();
        let high = score_item(&album, &queries[1]).overall_relevance();
        assert_eq!(low, 0.0);
        assert_eq!(high, 1.0);
    }

    #[test]
    fn test_adjective_follows_preferred_side() {
        let album = item("a", &[], features(0.1, 0.5));
        let query = MoodQuery {
            acousticness: Some(0.0),
            ..Default::default()
        };

        let adjective = score_item(&album, &query).parameters[0].adjective().unwrap();
        assert_eq!(adjective.to_string(), "Electric");
    }
}
