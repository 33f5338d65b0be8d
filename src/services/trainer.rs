//! The retrain pipeline: ratings table in, serving-ready model out.
//!
//! Runs after every catalog or rating mutation, fully recomputing the
//! model from the whole dataset. Callers hold the mutation lock across the
//! whole pipeline so a reader never observes the cache mid-swap.

use std::time::Instant;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    db::catalog,
    error::AppResult,
    services::{
        artifact::ModelArtifact,
        matrix::build_rating_matrix,
        serving::ServingCache,
        similarity::item_similarity,
    },
};

/// Rebuilds the model from the current database state, persists it, and
/// swaps it into the serving cache.
///
/// An empty ratings table still trains: the artifact carries the full
/// title list with a 0 x 0 similarity matrix, so the API stays usable
/// with a catalog and no ratings. Errors propagate to the caller, which
/// decides how to report degraded recommendation availability.
pub async fn retrain_and_reload(pool: &SqlitePool, serving: &ServingCache) -> AppResult<()> {
    let start = Instant::now();

    let movies = catalog::list_movies(pool).await?;
    let titles: Vec<String> = movies.into_iter().map(|m| m.title).collect();
    let rated = catalog::list_rated_titles(pool).await?;

    let matrix = build_rating_matrix(&rated, &titles);
    let similarity = item_similarity(&matrix.values);

    let artifact = ModelArtifact {
        trained_at: Utc::now(),
        user_ids: matrix.user_ids,
        titles: matrix.titles,
        ratings: matrix.values,
        similarity,
    };

    serving.store().save(&artifact)?;
    serving.reload().await?;

    tracing::info!(
        movies = titles.len(),
        ratings = rated.len(),
        users = artifact.user_ids.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "model retrained and reloaded"
    );

    Ok(())
}
