use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::serving::{RecommendError, Recommendations},
};

use super::AppState;

const DEFAULT_TOP_N: usize = 3;

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    top_n: Option<usize>,
}

/// Handler for `GET /recommend/{title}?top_n=N`.
///
/// Reads only the in-memory snapshot; never touches storage.
pub async fn recommend(
    State(state): State<AppState>,
    Path(title): Path<String>,
    Query(params): Query<RecommendQuery>,
) -> AppResult<Json<Recommendations>> {
    let top_n = params.top_n.unwrap_or(DEFAULT_TOP_N);

    let result = state
        .serving
        .recommend(&title, top_n)
        .await
        .map_err(|e| match e {
            RecommendError::Unavailable => AppError::ModelUnavailable(
                "Recommendation model is not loaded yet".to_string(),
            ),
            RecommendError::UnknownTitle(title) => {
                AppError::NotFound(format!("Movie '{}' not in model", title))
            }
        })?;

    Ok(Json(result))
}
