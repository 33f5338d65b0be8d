use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    models::ModelStatus,
    services::{serving::ServingCache, trainer},
};

pub mod movies;
pub mod ratings;
pub mod recommend;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub serving: Arc<ServingCache>,
    /// Serializes mutations against the retrain-and-reload pipeline
    pub train_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pool: SqlitePool, serving: Arc<ServingCache>) -> Self {
        Self {
            pool,
            serving,
            train_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/movies/", get(movies::list).post(movies::create))
        .route("/movies/:movie_id", get(movies::get).delete(movies::delete))
        .route("/rate/", post(ratings::create))
        .route("/recommend/:title", get(recommend::recommend))
        .fallback_service(ServeDir::new("static"))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Outside the trace layer so the span sees the inserted request id
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Runs the retrain pipeline for a mutation that has already been
/// persisted. A pipeline failure does not fail the request: the serving
/// cache is cleared so it cannot serve data from before the mutation, and
/// the response reports the model as degraded.
pub(crate) async fn retrain_after_mutation(state: &AppState) -> ModelStatus {
    match trainer::retrain_and_reload(&state.pool, &state.serving).await {
        Ok(()) => ModelStatus::Ready,
        Err(e) => {
            tracing::error!(error = %e, "retrain failed after mutation, clearing serving cache");
            state.serving.clear().await;
            ModelStatus::Degraded
        }
    }
}
