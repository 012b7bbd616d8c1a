use std::collections::HashMap;

use crate::models::{LibraryItem, MoodQuery};
use crate::services::scoring::score_item;

/// Ranks every genre in the library by relevance to a partial query
///
/// Items are scored with the genre dimension unset so a genre never biases its own
/// ranking. Each genre tag on an item accumulates `overall_relevance + matched_fraction`.
/// Ties keep first-seen order.
pub fn rank_genres(query: &MoodQuery, library: &[LibraryItem]) -> Vec<String> {
    let query = query.without_genres();

    let (order, totals) = library.iter().fold(
        (Vec::<String>::new(), HashMap::<String, f64>::new()),
        |(mut order, mut totals), item| {
            let scored = score_item(item, &query);
            let contribution = scored.overall_relevance() + scored.matched_fraction();

            for genre in &item.genres {
                match totals.get_mut(genre) {
                    Some(total) => *total += contribution,
                    None => {
                        order.push(genre.clone());
                        totals.insert(genre.clone(), contribution);
                    }
                }
            }

            (order, totals)
        },
    );

    let mut ranked: Vec<(String, f64)> = order
        .into_iter()
        .map(|genre| {
            let total = totals.get(&genre).copied().unwrap_or_default();
            (genre, total)
        })
        .collect();

    // sort_by is stable, so equal totals stay in first-seen order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    tracing::debug!(genres = ranked.len(), "Ranked library genres");

    ranked.into_iter().map(|(genre, _)| genre).collect()
}
