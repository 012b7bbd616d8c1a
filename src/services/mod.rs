pub mod categories;
pub mod expansion;
pub mod genre_ranking;
pub mod providers;
pub mod recommendations;
pub mod scoring;
pub mod selection;

pub use expansion::{ExpansionPage, ExpansionSession, ExpansionSettings};
pub use genre_ranking::rank_genres;
pub use providers::CatalogService;
pub use recommendations::recommend_by_query;
