//! The trained model artifact and its durable store.
//!
//! The artifact is serialized with bincode as a single versioned blob.
//! Writes go to a sibling temp file and are renamed into place, so a
//! concurrent reader sees either the previous blob or the new one, never a
//! partial write.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Bumped whenever the stored layout changes; older blobs fail to load and
/// are rewritten by the next retrain.
pub const FORMAT_VERSION: u32 = 1;

/// The trained model: rating matrix, item similarity, and the ordered
/// title list every matrix axis is aligned to.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub trained_at: DateTime<Utc>,
    /// Rating-matrix row labels, ascending
    pub user_ids: Vec<i64>,
    /// Catalog titles in catalog order; the column labels of `ratings` and
    /// both axes of `similarity`
    pub titles: Vec<String>,
    /// User x movie rating matrix
    pub ratings: Array2<f64>,
    /// Movie x movie cosine similarity, 0 x 0 when there are no ratings
    pub similarity: Array2<f64>,
}

impl ModelArtifact {
    /// True when there is no similarity data to serve recommendations from
    pub fn is_degenerate(&self) -> bool {
        self.similarity.is_empty()
    }
}

/// Matrices travel as shape + row-major data, the portable ndarray layout
#[derive(Debug, Serialize, Deserialize)]
struct StoredMatrix {
    shape: (usize, usize),
    data: Vec<f64>,
}

impl StoredMatrix {
    fn from_array(array: &Array2<f64>) -> Self {
        Self {
            shape: array.dim(),
            data: array.iter().copied().collect(),
        }
    }

    fn into_array(self) -> Result<Array2<f64>, ModelStoreError> {
        Array2::from_shape_vec(self.shape, self.data)
            .map_err(|e| ModelStoreError::Corrupt(e.to_string()))
    }
}

/// On-disk representation of the artifact
#[derive(Debug, Serialize, Deserialize)]
struct StoredArtifact {
    format_version: u32,
    trained_at: DateTime<Utc>,
    user_ids: Vec<i64>,
    titles: Vec<String>,
    ratings: StoredMatrix,
    similarity: StoredMatrix,
}

#[derive(thiserror::Error, Debug)]
pub enum ModelStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Corrupt artifact: {0}")]
    Corrupt(String),

    #[error("Unsupported artifact format version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}

/// Durable store for the model artifact at a fixed path
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists the artifact atomically: encode, write to `<path>.tmp`,
    /// rename onto `<path>`.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<(), ModelStoreError> {
        let stored = StoredArtifact {
            format_version: FORMAT_VERSION,
            trained_at: artifact.trained_at,
            user_ids: artifact.user_ids.clone(),
            titles: artifact.titles.clone(),
            ratings: StoredMatrix::from_array(&artifact.ratings),
            similarity: StoredMatrix::from_array(&artifact.similarity),
        };

        let encoded = bincode::serialize(&stored)?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &encoded)?;
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            bytes = encoded.len(),
            "model artifact persisted"
        );

        Ok(())
    }

    /// Loads the last persisted artifact; `Ok(None)` means no artifact has
    /// been written yet. Decode failures and version mismatches are errors,
    /// not the empty sentinel.
    pub fn load(&self) -> Result<Option<ModelArtifact>, ModelStoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredArtifact = bincode::deserialize(&bytes)?;
        if stored.format_version != FORMAT_VERSION {
            return Err(ModelStoreError::VersionMismatch {
                found: stored.format_version,
                expected: FORMAT_VERSION,
            });
        }

        Ok(Some(ModelArtifact {
            trained_at: stored.trained_at,
            user_ids: stored.user_ids,
            titles: stored.titles,
            ratings: stored.ratings.into_array()?,
            similarity: stored.similarity.into_array()?,
        }))
    }
}
