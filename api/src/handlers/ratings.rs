//! Rating handlers
//!
//! Endpoints for submitting, removing and listing one entity's ratings.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{EntityId, RaterId};
use crate::domain::ports::RatingStore;
use crate::error::AppError;
use crate::AppState;

/// Request body for rating submission
#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    /// Rater identity
    pub user_id: String,
    pub rating: i32,
}

/// One rating as returned by the list endpoint
#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub user_id: String,
    pub driver_id: String,
    pub rating: i32,
}

/// POST /drivers/:entity_id/ratings
///
/// Create or replace the caller's rating of a driver.
pub async fn submit_rating<S: RatingStore + 'static>(
    State(state): State<AppState<S>>,
    Path(entity_id): Path<String>,
    Json(request): Json<SubmitRatingRequest>,
) -> Result<StatusCode, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id must not be empty".to_string()));
    }

    state
        .engine
        .submit_rating(
            &EntityId(entity_id),
            &RaterId(request.user_id),
            request.rating,
        )
        .await?;

    Ok(StatusCode::OK)
}

/// DELETE /drivers/:entity_id/ratings/:rater_id
pub async fn remove_rating<S: RatingStore + 'static>(
    State(state): State<AppState<S>>,
    Path((entity_id, rater_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .engine
        .remove_rating(&EntityId(entity_id), &RaterId(rater_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /drivers/:entity_id/ratings
pub async fn list_ratings<S: RatingStore + 'static>(
    State(state): State<AppState<S>>,
    Path(entity_id): Path<String>,
) -> Result<Json<Vec<RatingResponse>>, AppError> {
    let entity_id = EntityId(entity_id);
    let ratings = state.queries.list_ratings(&entity_id).await?;

    Ok(Json(
        ratings
            .into_iter()
            .map(|r| RatingResponse {
                user_id: r.rater_id.0,
                driver_id: entity_id.0.clone(),
                rating: r.value,
            })
            .collect(),
    ))
}
