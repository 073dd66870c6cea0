//! Entity listing handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::domain::ports::RatingStore;
use crate::error::AppError;
use crate::AppState;

/// A driver with its current average rating
#[derive(Debug, Serialize)]
pub struct EntityResponse {
    pub id: String,
    pub driver_info: String,
    /// `null` until the driver has been rated
    pub avg_rating: Option<f64>,
}

/// GET /drivers
pub async fn list_entities<S: RatingStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<EntityResponse>>, AppError> {
    let entities = state.queries.list_entities().await?;

    Ok(Json(
        entities
            .into_iter()
            .map(|e| EntityResponse {
                id: e.entity_id.0,
                driver_info: e.info,
                avg_rating: e.average_rating,
            })
            .collect(),
    ))
}
