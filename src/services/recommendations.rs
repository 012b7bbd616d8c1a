use crate::{
    models::{LibraryItem, MoodQuery, RecommendationCategory},
    services::{
        categories::build_candidates,
        scoring::{score_item, ScoredItem},
        selection::{item_result, select_categories, MIN_CATEGORY_POPULATION},
    },
};

/// Title of the group holding every fully relevant item
pub const BEST_MATCH_TITLE: &str = "Best Overall Match";

/// Groups the user's saved items into non-overlapping mood categories
///
/// Items matching every dimension of the query are collected first under
/// "Best Overall Match". The remaining relevant items are grouped into the most
/// specific categories available, each holding at least two items. No item appears
/// in more than one category.
pub fn recommend_by_query(
    query: &MoodQuery,
    library: &[LibraryItem],
) -> Vec<RecommendationCategory> {
    let scored: Vec<ScoredItem> = library.iter().map(|item| score_item(item, query)).collect();
    let pool = build_candidates(&scored);

    let mut categories = Vec::new();

    if !pool.best_match.is_empty() {
        categories.push(RecommendationCategory {
            title: BEST_MATCH_TITLE.to_string(),
            items: pool
                .best_match
                .iter()
                .map(|index| item_result(&scored[*index]))
                .collect(),
        });
    }

    categories.extend(select_categories(
        &scored,
        pool.candidates,
        MIN_CATEGORY_POPULATION,
    ));

    tracing::info!(
        library_size = library.len(),
        dimensions = query.dimension_count(),
        categories = categories.len(),
        grouped_items = categories.iter().map(|c| c.items.len()).sum::<usize>(),
        "Mood recommendations computed"
    );

    categories
}
