use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{
    db::catalog,
    error::{AppError, AppResult},
    models::{ModelStatus, NewRating, Rating},
};

use super::{retrain_after_mutation, AppState};

#[derive(Debug, Serialize)]
pub struct RatingCreated {
    pub rating: Rating,
    pub model: ModelStatus,
}

/// Handler for `POST /rate/`: stores the rating and retrains.
///
/// The 0-5 bound lives here at the API boundary; the model itself accepts
/// any numeric rating.
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewRating>,
) -> AppResult<(StatusCode, Json<RatingCreated>)> {
    if !(0.0..=5.0).contains(&payload.rating) {
        return Err(AppError::InvalidInput(format!(
            "Rating must be between 0 and 5, got {}",
            payload.rating
        )));
    }

    let _guard = state.train_lock.lock().await;

    // Resolve the FK up front so an unknown movie is a 404, not a
    // constraint error
    if catalog::get_movie(&state.pool, payload.movie_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Movie {} not found",
            payload.movie_id
        )));
    }

    let rating = catalog::insert_rating(&state.pool, &payload).await?;
    let model = retrain_after_mutation(&state).await;

    Ok((StatusCode::CREATED, Json(RatingCreated { rating, model })))
}
