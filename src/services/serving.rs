//! In-memory serving cache for the trained model.
//!
//! Holds the active artifact as a swappable snapshot behind a `RwLock`.
//! Recommendation reads clone an `Arc` to the snapshot and do zero I/O;
//! the durable copy is only touched by `reload`.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::services::artifact::{ModelArtifact, ModelStore, ModelStoreError};

/// Cache lifecycle: `Empty` until a reload succeeds, `Empty` again after a
/// failed reload. Queries are only served while `Ready`.
#[derive(Debug, Clone, Default)]
pub enum ServingState {
    #[default]
    Empty,
    Ready(Arc<ModelArtifact>),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RecommendError {
    #[error("Recommendation model is not loaded")]
    Unavailable,

    #[error("Movie '{0}' not in model")]
    UnknownTitle(String),
}

/// A recommended title with its similarity score
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub score: f64,
}

/// Result of a recommendation query; `input` is the canonical catalog
/// spelling of the queried title.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendations {
    pub input: String,
    pub recommendations: Vec<Recommendation>,
}

/// The serving cache; owns the durable store it reloads from
pub struct ServingCache {
    store: ModelStore,
    state: RwLock<ServingState>,
}

impl ServingCache {
    /// Creates an empty cache over the given store; call `reload` to arm it
    pub fn new(store: ModelStore) -> Self {
        Self {
            store,
            state: RwLock::new(ServingState::Empty),
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Swaps in the latest durable artifact. Returns `Ok(true)` when the
    /// cache is Ready afterwards, `Ok(false)` when no artifact exists yet.
    /// On a load failure the cache is forced Empty before the error is
    /// returned, so it can never serve a stale snapshot past a bad reload.
    pub async fn reload(&self) -> Result<bool, ModelStoreError> {
        match self.store.load() {
            Ok(Some(artifact)) => {
                tracing::info!(
                    movies = artifact.titles.len(),
                    users = artifact.user_ids.len(),
                    trained_at = %artifact.trained_at,
                    "serving cache reloaded"
                );
                *self.state.write().await = ServingState::Ready(Arc::new(artifact));
                Ok(true)
            }
            Ok(None) => {
                tracing::info!(path = %self.store.path().display(), "no model artifact yet, serving cache empty");
                *self.state.write().await = ServingState::Empty;
                Ok(false)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to reload model artifact, serving cache empty");
                *self.state.write().await = ServingState::Empty;
                Err(e)
            }
        }
    }

    /// Forces the cache Empty; used when a retrain fails mid-pipeline so
    /// stale similarity data is never served against newer catalog state.
    pub async fn clear(&self) {
        *self.state.write().await = ServingState::Empty;
    }

    pub async fn is_ready(&self) -> bool {
        matches!(&*self.state.read().await, ServingState::Ready(_))
    }

    /// Returns the `top_n` most similar titles to `title`, excluding the
    /// queried movie itself.
    ///
    /// The lookup is a case-insensitive exact match against the cached
    /// title list (first match wins). Ranking is by similarity descending,
    /// ties broken by catalog order; a `top_n` larger than the remaining
    /// catalog returns everything. A degenerate model (no ratings yet)
    /// yields an empty recommendation list, not an error.
    pub async fn recommend(
        &self,
        title: &str,
        top_n: usize,
    ) -> Result<Recommendations, RecommendError> {
        let snapshot = match &*self.state.read().await {
            ServingState::Ready(artifact) => Arc::clone(artifact),
            ServingState::Empty => return Err(RecommendError::Unavailable),
        };

        let wanted = title.to_lowercase();
        let index = snapshot
            .titles
            .iter()
            .position(|t| t.to_lowercase() == wanted)
            .ok_or_else(|| RecommendError::UnknownTitle(title.to_string()))?;

        let canonical = snapshot.titles[index].clone();

        if snapshot.is_degenerate() {
            return Ok(Recommendations {
                input: canonical,
                recommendations: Vec::new(),
            });
        }

        let row = snapshot.similarity.row(index);
        let mut scored: Vec<Recommendation> = snapshot
            .titles
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(i, t)| Recommendation {
                title: t.clone(),
                score: row[i],
            })
            .collect();

        // Stable sort keeps catalog order among equal scores
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_n);

        Ok(Recommendations {
            input: canonical,
            recommendations: scored,
        })
    }
}
