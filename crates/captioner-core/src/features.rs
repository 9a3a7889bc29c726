//! Precomputed image feature vectors keyed by image id.
//!
//! The store is loaded once at startup and never written afterwards, so it is
//! shared between requests behind an `Arc` without locking.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::AssetError;

/// One image's feature vector. Cloning is cheap (shared slice).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Arc<[f32]>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values.into())
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Vectors are stored either flat or with a leading batch axis of 1,
/// which is how the upstream extractor emits them.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawVector {
    Flat(Vec<f32>),
    Batched(Vec<Vec<f32>>),
}

impl RawVector {
    fn flatten(self) -> Option<Vec<f32>> {
        match self {
            RawVector::Flat(v) => Some(v),
            RawVector::Batched(mut rows) if rows.len() == 1 => rows.pop(),
            RawVector::Batched(_) => None,
        }
    }
}

/// Read-only mapping from image id to feature vector.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    vectors: HashMap<String, FeatureVector>,
    dim: usize,
}

impl FeatureStore {
    /// Load a JSON object of `image_id -> [f32; dim]` from disk.
    ///
    /// Fails if any vector does not have exactly `dim` elements.
    pub fn load(path: &Path, dim: usize) -> Result<Self, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }

        tracing::info!("Loading image features from {:?}", path);
        let file = std::fs::File::open(path).map_err(|e| AssetError::Features {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let raw: HashMap<String, RawVector> =
            serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| {
                AssetError::Features {
                    path: path.to_path_buf(),
                    message: format!("Invalid feature mapping: {e}"),
                }
            })?;

        let mut vectors = HashMap::with_capacity(raw.len());
        for (image_id, vector) in raw {
            let values = vector.flatten().ok_or_else(|| AssetError::Features {
                path: path.to_path_buf(),
                message: format!("Feature for {image_id:?} has more than one row"),
            })?;
            vectors.insert(image_id, values);
        }

        let store = Self::from_map(vectors, dim).map_err(|message| AssetError::Features {
            path: path.to_path_buf(),
            message,
        })?;
        tracing::info!("Loaded {} feature vectors (dim {})", store.len(), dim);
        Ok(store)
    }

    /// Build a store from in-memory vectors, checking every dimension.
    pub fn from_map(vectors: HashMap<String, Vec<f32>>, dim: usize) -> Result<Self, String> {
        let mut store = HashMap::with_capacity(vectors.len());
        for (image_id, values) in vectors {
            if values.len() != dim {
                return Err(format!(
                    "Feature for {image_id:?} has {} elements, expected {dim}",
                    values.len()
                ));
            }
            store.insert(image_id, FeatureVector::new(values));
        }
        Ok(Self {
            vectors: store,
            dim,
        })
    }

    /// Look up the feature vector for an image id.
    pub fn lookup(&self, image_id: &str) -> Option<FeatureVector> {
        self.vectors.get(image_id).cloned()
    }

    pub fn contains(&self, image_id: &str) -> bool {
        self.vectors.contains_key(image_id)
    }

    /// Dimension every stored vector has.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
