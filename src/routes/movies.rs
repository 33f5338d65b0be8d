use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{
    db::catalog,
    error::{AppError, AppResult},
    models::{ModelStatus, Movie, NewMovie},
};

use super::{retrain_after_mutation, AppState};

/// Response for a mutation: the affected row plus whether the serving
/// model was refreshed
#[derive(Debug, Serialize)]
pub struct MovieCreated {
    pub movie: Movie,
    pub model: ModelStatus,
}

#[derive(Debug, Serialize)]
pub struct MovieDeleted {
    pub deleted: Movie,
    pub model: ModelStatus,
}

/// Handler for `GET /movies/`: the catalog in catalog order
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Movie>>> {
    let movies = catalog::list_movies(&state.pool).await?;
    Ok(Json(movies))
}

/// Handler for `GET /movies/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Movie>> {
    let movie = catalog::get_movie(&state.pool, movie_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;
    Ok(Json(movie))
}

/// Handler for `POST /movies/`: inserts the movie, then retrains so the
/// new title appears as a similarity column immediately
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewMovie>,
) -> AppResult<(StatusCode, Json<MovieCreated>)> {
    if payload.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Movie title must not be empty".to_string()));
    }

    let _guard = state.train_lock.lock().await;

    if catalog::get_movie(&state.pool, payload.movie_id).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Movie id {} already exists",
            payload.movie_id
        )));
    }
    if catalog::title_exists(&state.pool, &payload.title).await? {
        return Err(AppError::Conflict(format!(
            "Movie title '{}' already exists",
            payload.title
        )));
    }

    let movie = catalog::insert_movie(&state.pool, &payload).await?;
    let model = retrain_after_mutation(&state).await;

    Ok((StatusCode::CREATED, Json(MovieCreated { movie, model })))
}

/// Handler for `DELETE /movies/{id}`: removes the movie and, via the FK
/// cascade, all its ratings, then retrains without them
pub async fn delete(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<MovieDeleted>> {
    let _guard = state.train_lock.lock().await;

    let movie = catalog::get_movie(&state.pool, movie_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;

    catalog::delete_movie(&state.pool, movie_id).await?;
    let model = retrain_after_mutation(&state).await;

    Ok(Json(MovieDeleted { deleted: movie, model }))
}
