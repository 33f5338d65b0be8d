use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cinerec_api::{
    config::Config,
    db,
    routes::{create_router, AppState},
    services::{artifact::ModelStore, serving::ServingCache, trainer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let serving = Arc::new(ServingCache::new(ModelStore::new(&config.model_path)));

    // Train a fresh model at boot when none exists; a failed reload is
    // logged and leaves the cache empty until the next mutation retrains.
    match serving.reload().await {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("no model artifact found, training a fresh model");
            trainer::retrain_and_reload(&pool, &serving).await?;
        }
        Err(e) => {
            tracing::warn!(error = %e, "stored model unreadable, retraining");
            trainer::retrain_and_reload(&pool, &serving).await?;
        }
    }

    let state = AppState::new(pool, serving);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "server running");
    axum::serve(listener, app).await?;

    Ok(())
}
