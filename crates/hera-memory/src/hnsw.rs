//! Approximate nearest-neighbour index over cosine distance, backed by `hnsw_rs`.
//!
//! The raw vectors are kept next to the graph so the index can be persisted as
//! plain data and rebuilt on load. Point ids are insertion positions.

use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};

/// Upper bound on graph layers, matching `hnsw_rs`'s own limit.
const MAX_LAYER: usize = 16;
const MIN_CAPACITY: usize = 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HnswError {
    #[error("empty vector")]
    EmptyVector,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Max neighbours per point (the `M` parameter).
    pub max_nb_connection: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            max_nb_connection: 16,
            ef_construction: 200,
            ef_search: 64,
        }
    }
}

pub struct HnswIndex {
    params: HnswParams,
    vectors: Vec<Vec<f32>>,
    graph: Hnsw<'static, f32, DistCosine>,
}

impl HnswIndex {
    #[must_use]
    pub fn new(params: HnswParams) -> Self {
        Self::with_capacity(params, 0)
    }

    fn with_capacity(params: HnswParams, capacity: usize) -> Self {
        Self {
            params,
            vectors: Vec::with_capacity(capacity),
            graph: Hnsw::new(
                params.max_nb_connection,
                capacity.max(MIN_CAPACITY),
                MAX_LAYER,
                params.ef_construction,
                DistCosine,
            ),
        }
    }

    /// Build a graph over `vectors`, keeping their order as point ids.
    ///
    /// # Errors
    ///
    /// Returns the first vector that is empty or disagrees in dimension.
    pub fn from_vectors(params: HnswParams, vectors: Vec<Vec<f32>>) -> Result<Self, HnswError> {
        let mut index = Self::with_capacity(params, vectors.len());
        for vector in vectors {
            index.insert(vector)?;
        }
        Ok(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    #[must_use]
    pub fn params(&self) -> HnswParams {
        self.params
    }

    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.vectors.first().map(Vec::len)
    }

    #[must_use]
    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        self.vectors.get(id).map(Vec::as_slice)
    }

    /// Whether `vector` could be inserted next.
    ///
    /// # Errors
    ///
    /// Returns `EmptyVector` or `DimensionMismatch`.
    pub fn check(&self, vector: &[f32]) -> Result<(), HnswError> {
        check_against(self.dimension(), vector)
    }

    /// Insert a vector and return its point id (the previous `len()`).
    ///
    /// # Errors
    ///
    /// Returns `EmptyVector` or `DimensionMismatch`; the index is unchanged.
    pub fn insert(&mut self, vector: Vec<f32>) -> Result<usize, HnswError> {
        self.check(&vector)?;
        let id = self.vectors.len();
        // A zero vector has no direction; it is stored but never returned.
        if let Some(unit) = normalize(&vector) {
            self.graph.insert((&unit, id));
        }
        self.vectors.push(vector);
        Ok(id)
    }

    /// Up to `k` `(point id, cosine similarity)` pairs, best first.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if k == 0 || self.dimension() != Some(query.len()) {
            return Vec::new();
        }
        let Some(unit) = normalize(query) else {
            return Vec::new();
        };

        let ef = self.params.ef_search.max(k);
        let mut hits: Vec<(usize, f32)> = self
            .graph
            .search(&unit, k, ef)
            .into_iter()
            .filter(|n| n.d_id < self.vectors.len())
            .map(|n| (n.d_id, 1.0 - n.distance))
            .collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        hits.truncate(k);
        hits
    }
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("params", &self.params)
            .field("len", &self.vectors.len())
            .field("dimension", &self.dimension())
            .finish_non_exhaustive()
    }
}

/// Validate `vector` against an index of dimension `dimension` (`None` when empty).
///
/// # Errors
///
/// Returns `EmptyVector` or `DimensionMismatch`.
pub fn check_against(dimension: Option<usize>, vector: &[f32]) -> Result<(), HnswError> {
    if vector.is_empty() {
        return Err(HnswError::EmptyVector);
    }
    match dimension {
        Some(expected) if expected != vector.len() => Err(HnswError::DimensionMismatch {
            expected,
            got: vector.len(),
        }),
        _ => Ok(()),
    }
}

fn normalize(vector: &[f32]) -> Option<Vec<f32>> {
    let magnitude = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return None;
    }
    Some(vector.iter().map(|x| x / magnitude).collect())
}
