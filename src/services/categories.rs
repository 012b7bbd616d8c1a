use std::collections::{BTreeMap, BTreeSet};

use crate::models::Familiarity;
use crate::services::scoring::{Adjective, RelevanceParameter, ScoredItem};

/// Items at or below this overall relevance never enter a category
pub const MIN_OVERALL_RELEVANCE: f64 = 0.5;

/// Largest number of labels a compound category combines
pub const MAX_SPECIFICITY: usize = 4;

/// One matched dimension an item can be grouped by
///
/// Variant order is also the order label groups appear in titles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Adjective(Adjective),
    Genre(String),
    Familiarity(Familiarity),
}

/// Identity of a candidate category: its sorted set of labels
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryKey {
    labels: Vec<Label>,
}

impl CategoryKey {
    pub fn new(mut labels: Vec<Label>) -> Self {
        labels.sort();
        labels.dedup();
        Self { labels }
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Number of query dimensions the category represents
    pub fn specificity(&self) -> usize {
        self.labels.len()
    }

    /// Display title, e.g. "Acoustic, Chill & Happy, Indie Rock, Current Favorites"
    pub fn title(&self) -> String {
        let mut adjectives = Vec::new();
        let mut parts = Vec::new();

        for label in &self.labels {
            match label {
                Label::Adjective(adjective) => adjectives.push(adjective.to_string()),
                Label::Genre(genre) => parts.push(title_case(genre)),
                Label::Familiarity(familiarity) => parts.push(familiarity.label().to_string()),
            }
        }

        if !adjectives.is_empty() {
            parts.insert(0, join_list(&adjectives));
        }

        parts.join(", ")
    }
}

/// Candidate categories and the indices of the scored items qualifying for each
pub type CandidateMap = BTreeMap<CategoryKey, BTreeSet<usize>>;

/// Output of the category builder
#[derive(Debug, Default)]
pub struct CandidatePool {
    /// Fully relevant items, best first; they never enter `candidates`
    pub best_match: Vec<usize>,
    pub candidates: CandidateMap,
}

/// Whether a scored item is relevant enough to be grouped at all
pub fn is_candidate(scored: &ScoredItem) -> bool {
    scored.partially_relevant() && scored.overall_relevance() > MIN_OVERALL_RELEVANCE
}

/// Builds the best-match group and the universe of candidate categories
///
/// Indices refer to positions in `scored`.
pub fn build_candidates(scored: &[ScoredItem]) -> CandidatePool {
    let mut pool = CandidatePool::default();

    for (index, item) in scored.iter().enumerate() {
        if !is_candidate(item) {
            continue;
        }

        if item.fully_relevant() {
            pool.best_match.push(index);
            continue;
        }

        for key in category_keys(item) {
            pool.candidates.entry(key).or_default().insert(index);
        }
    }

    pool.best_match.sort_by(|a, b| {
        scored[*b]
            .overall_relevance()
            .total_cmp(&scored[*a].overall_relevance())
    });

    tracing::debug!(
        best_match = pool.best_match.len(),
        candidates = pool.candidates.len(),
        "Built candidate categories"
    );

    pool
}

/// Labels an item earned from its matched parameters
#[derive(Debug, Default)]
struct EarnedLabels {
    adjectives: Vec<Label>,
    genres: Vec<Label>,
    familiarity: Option<Label>,
}

fn earned_labels(scored: &ScoredItem) -> EarnedLabels {
    let mut earned = EarnedLabels::default();

    for parameter in scored.matched_parameters() {
        match parameter {
            RelevanceParameter::Spectrum { .. } => {
                if let Some(adjective) = parameter.adjective() {
                    earned.adjectives.push(Label::Adjective(adjective));
                }
            }
            RelevanceParameter::Familiarity { familiarity, .. } => {
                earned.familiarity = Some(Label::Familiarity(*familiarity));
            }
            RelevanceParameter::Genre { matched } => {
                earned
                    .genres
                    .extend(matched.iter().cloned().map(Label::Genre));
            }
        }
    }

    earned
}

/// Every category key one item qualifies for, capped at `MAX_SPECIFICITY` labels
fn category_keys(scored: &ScoredItem) -> BTreeSet<CategoryKey> {
    let earned = earned_labels(scored);
    let mut keys = BTreeSet::new();

    let adjective_combos = |max: usize| -> Vec<Vec<Label>> {
        (0..=max.min(earned.adjectives.len()))
            .flat_map(|k| combinations(&earned.adjectives, k))
            .collect()
    };

    // Adjectives alone, singly and combined
    for combo in adjective_combos(MAX_SPECIFICITY) {
        if !combo.is_empty() {
            keys.insert(CategoryKey::new(combo));
        }
    }

    if let Some(familiarity) = &earned.familiarity {
        for mut combo in adjective_combos(MAX_SPECIFICITY - 1) {
            combo.push(familiarity.clone());
            keys.insert(CategoryKey::new(combo));
        }
    }

    for genre in &earned.genres {
        for mut combo in adjective_combos(MAX_SPECIFICITY - 1) {
            combo.push(genre.clone());
            keys.insert(CategoryKey::new(combo));
        }

        if let Some(familiarity) = &earned.familiarity {
            for mut combo in adjective_combos(MAX_SPECIFICITY - 2) {
                combo.push(genre.clone());
                combo.push(familiarity.clone());
                keys.insert(CategoryKey::new(combo));
            }
        }
    }

    keys
}

/// All size-`k` subsets of `items`, preserving order
fn combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if items.len() < k {
        return Vec::new();
    }

    let mut result = Vec::new();
    for (i, first) in items.iter().enumerate() {
        for mut rest in combinations(&items[i + 1..], k - 1) {
            rest.insert(0, first.clone());
            result.push(rest);
        }
    }
    result
}

fn join_list(words: &[String]) -> String {
    match words {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} & {}", init.join(", "), last),
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LibraryItem, MoodQuery};
    use crate::services::scoring::tests::{features, item};
    use crate::services::scoring::{score_item, SpectrumDimension};

    fn adjective(dimension: SpectrumDimension, high: bool) -> Label {
        Label::Adjective(Adjective { dimension, high })
    }

    #[test]
    fn test_combinations() {
        let items = [1, 2, 3, 4];
        assert_eq!(combinations(&items, 0), vec![Vec::<i32>::new()]);
        assert_eq!(combinations(&items, 2).len(), 6);
        assert_eq!(combinations(&items, 4), vec![vec![1, 2, 3, 4]]);
        assert!(combinations(&items, 5).is_empty());
    }

    #[test]
    fn test_join_list() {
        let words = |w: &[&str]| w.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(join_list(&words(&["Acoustic"])), "Acoustic");
        assert_eq!(join_list(&words(&["Acoustic", "Chill"])), "Acoustic & Chill");
        assert_eq!(
            join_list(&words(&["Acoustic", "Happy", "Chill"])),
            "Acoustic, Happy & Chill"
        );
    }

    #[test]
    fn test_title_formatting() {
        let key = CategoryKey::new(vec![
            Label::Familiarity(Familiarity::CurrentFavorite),
            Label::Genre("indie rock".to_string()),
            adjective(SpectrumDimension::Energy, false),
            adjective(SpectrumDimension::Acousticness, true),
        ]);

        assert_eq!(key.specificity(), 4);
        assert_eq!(
            key.title(),
            "Acoustic & Chill, Indie Rock, Current Favorites"
        );
    }

    #[test]
    fn test_singleton_titles() {
        assert_eq!(
            CategoryKey::new(vec![Label::Genre("hip hop".to_string())]).title(),
            "Hip Hop"
        );
        assert_eq!(
            CategoryKey::new(vec![Label::Familiarity(Familiarity::UnderappreciatedGem)]).title(),
            "Underappreciated Gems"
        );
    }

    #[test]
    fn test_category_keys_cover_all_combinations() {
        let mut album = item("a", &["rock"], features(0.9, 0.9));
        album.features.energy = 0.9;
        album.familiarity.recently_played = true;

        let query = MoodQuery {
            acousticness: Some(1.0),
            danceability: Some(1.0),
            energy: Some(1.0),
            familiarity: Some(Familiarity::CurrentFavorite),
            genres: Some(BTreeSet::from(["rock".to_string()])),
            ..Default::default()
        };
        let scored = score_item(&album, &query);
        let keys = category_keys(&scored);

        // 3 adjectives: 7 non-empty combos
        // + familiarity with combos of size 0..=3: 8
        // + genre with combos of size 0..=3: 8
        // + genre & familiarity with combos of size 0..=2: 7
        assert_eq!(keys.len(), 30);
        assert!(keys.iter().all(|k| k.specificity() <= MAX_SPECIFICITY));
        assert!(keys.contains(&CategoryKey::new(vec![
            adjective(SpectrumDimension::Acousticness, true),
            Label::Genre("rock".to_string()),
            Label::Familiarity(Familiarity::CurrentFavorite),
        ])));
    }

    #[test]
    fn test_unmatched_dimensions_earn_no_labels() {
        let album = item("b", &["rock"], features(0.1, 0.9));
        let query = MoodQuery {
            acousticness: Some(1.0),
            genres: Some(BTreeSet::from(["rock".to_string()])),
            ..Default::default()
        };
        let scored = score_item(&album, &query);
        let keys = category_keys(&scored);

        assert_eq!(
            keys,
            BTreeSet::from([CategoryKey::new(vec![Label::Genre("rock".to_string())])])
        );
    }

    #[test]
    fn test_best_match_is_carved_out() {
        let library: Vec<LibraryItem> = vec![
            item("a", &["rock"], features(0.9, 0.2)),
            item("b", &["rock"], features(0.1, 0.9)),
            item("c", &["rock"], features(1.0, 0.5)),
            item("d", &["jazz"], features(0.0, 0.5)),
        ];
        let query = MoodQuery {
            acousticness: Some(1.0),
            genres: Some(BTreeSet::from(["rock".to_string()])),
            ..Default::default()
        };
        let scored: Vec<_> = library.iter().map(|i| score_item(i, &query)).collect();
        let pool = build_candidates(&scored);

        // c scores 1.0, a scores 0.95
        assert_eq!(pool.best_match, vec![2, 0]);
        // d matches nothing and is dropped entirely
        let members: BTreeSet<usize> = pool.candidates.values().flatten().copied().collect();
        assert_eq!(members, BTreeSet::from([1]));
    }

    #[test]
    fn test_low_overall_relevance_is_excluded() {
        let album = item("a", &["rock"], features(0.0, 0.0));
        let query = MoodQuery {
            acousticness: Some(1.0),
            danceability: Some(1.0),
            genres: Some(BTreeSet::from(["rock".to_string()])),
            ..Default::default()
        };
        let scored = score_item(&album, &query);

        assert!(scored.partially_relevant());
        assert!(!is_candidate(&scored));
    }
}
