use std::collections::BTreeSet;

use crate::models::{ItemResult, RecommendationCategory};
use crate::services::categories::{CandidateMap, CategoryKey};
use crate::services::scoring::ScoredItem;

/// Smallest category the selector will emit
pub const MIN_CATEGORY_POPULATION: usize = 2;

/// Greedily picks non-overlapping categories, most specific first
///
/// Each round takes the populated candidate with the highest specificity, breaking
/// ties by the mean overall relevance of its remaining members and then by key
/// order. The emitted members are removed from every other candidate, so no item
/// is emitted twice.
pub fn select_categories(
    scored: &[ScoredItem],
    mut candidates: CandidateMap,
    min_population: usize,
) -> Vec<RecommendationCategory> {
    let mut selected = Vec::new();

    loop {
        candidates.retain(|_, members| members.len() >= min_population);

        let Some(key) = pick_next(scored, &candidates) else {
            break;
        };
        let Some(members) = candidates.remove(&key) else {
            break;
        };

        for remaining in candidates.values_mut() {
            remaining.retain(|index| !members.contains(index));
        }

        tracing::debug!(
            title = %key.title(),
            specificity = key.specificity(),
            members = members.len(),
            "Selected category"
        );

        selected.push(RecommendationCategory {
            title: key.title(),
            items: ranked_results(scored, &members),
        });
    }

    selected
}

fn pick_next(scored: &[ScoredItem], candidates: &CandidateMap) -> Option<CategoryKey> {
    let mut best: Option<(&CategoryKey, usize, f64)> = None;

    for (key, members) in candidates {
        let specificity = key.specificity();
        let relevance = mean_relevance(scored, members);

        let better = match best {
            None => true,
            Some((_, best_specificity, best_relevance)) => {
                specificity > best_specificity
                    || (specificity == best_specificity && relevance > best_relevance)
            }
        };

        if better {
            best = Some((key, specificity, relevance));
        }
    }

    best.map(|(key, _, _)| key.clone())
}

fn mean_relevance(scored: &[ScoredItem], members: &BTreeSet<usize>) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    let total: f64 = members
        .iter()
        .map(|index| scored[*index].overall_relevance())
        .sum();
    total / members.len() as f64
}

/// Members ordered by matched dimensions, then overall relevance, both descending
fn ranked_results(scored: &[ScoredItem], members: &BTreeSet<usize>) -> Vec<ItemResult> {
    let mut ordered: Vec<&ScoredItem> = members.iter().map(|index| &scored[*index]).collect();

    ordered.sort_by(|a, b| {
        b.matched_count()
            .cmp(&a.matched_count())
            .then_with(|| b.overall_relevance().total_cmp(&a.overall_relevance()))
    });

    ordered.into_iter().map(item_result).collect()
}

pub fn item_result(scored: &ScoredItem) -> ItemResult {
    ItemResult {
        item: scored.item.clone(),
        overall_relevance: scored.overall_relevance(),
        matched_dimensions: scored.matched_count(),
    }
}
