use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;
use crate::middleware::{assign_request_id, request_span};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(middleware::from_fn(assign_request_id))
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations/mood", post(handlers::recommend_by_mood))
        .route("/genres/ranked", post(handlers::ranked_genres))
        .route("/expansion/sessions", post(handlers::create_session))
        .route("/expansion/sessions/:id", delete(handlers::close_session))
        .route("/expansion/sessions/:id/next", post(handlers::next_page))
}
