use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{LibraryItem, MoodRequest, RecommendationCategory};
use crate::services::{rank_genres, recommend_by_query};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    pub library: Vec<LibraryItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Groups the submitted library into mood categories
pub async fn recommend_by_mood(
    Json(request): Json<MoodRequest>,
) -> AppResult<Json<Vec<RecommendationCategory>>> {
    request.query.validate()?;
    Ok(Json(recommend_by_query(&request.query, &request.library)))
}

/// Orders the library's genres by fit with the query's other dimensions
pub async fn ranked_genres(Json(request): Json<MoodRequest>) -> AppResult<Json<Vec<String>>> {
    request.query.validate()?;
    Ok(Json(rank_genres(&request.query, &request.library)))
}

/// Opens a library-expansion session
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let user_id = match request.user_id {
        Some(id) if id.trim().is_empty() => {
            return Err(AppError::InvalidInput("user_id cannot be blank".to_string()))
        }
        other => other,
    };

    let (session_id, entry) = state.open_session(user_id, &request.library).await;
    let created_at = entry.session.lock().await.created_at();

    tracing::info!(
        %session_id,
        user_id = entry.user_id.as_deref().unwrap_or("anonymous"),
        library_size = request.library.len(),
        "Expansion session opened"
    );

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            created_at,
        }),
    ))
}

/// Serves the next page of a session, 204 when the page came up empty
pub async fn next_page(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Response> {
    let entry = state
        .session(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Expansion session {}", session_id)))?;

    let page = entry.session.lock().await.recommend_next_page().await;

    let Some(page) = page else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    if let (Some(history), Some(user_id)) = (&state.history, &entry.user_id) {
        let ids: Vec<String> = page.items.iter().map(|item| item.id.clone()).collect();
        history.record(user_id, &ids).await;
    }

    Ok(Json(page).into_response())
}

/// Closes a session
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.close_session(&session_id).await {
        tracing::info!(%session_id, "Expansion session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Expansion session {}", session_id)))
    }
}
