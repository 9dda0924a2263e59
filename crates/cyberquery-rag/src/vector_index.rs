//! HNSW Vector Index for Semantic Search
//!
//! A thin wrapper around `hnsw_rs` that stores chunk positions keyed by
//! embedding vector and answers k-nearest-neighbour queries.
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//! - **efConstruction**: Candidate list size during construction (default: 200)
//! - **efSearch**: Candidate list size during search (at least 64)
//!
//! The index is built once and then only read, so it carries no interior
//! locking. Callers that rebuild replace the whole index.

use hnsw_rs::prelude::*;
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_EF_SEARCH: usize = 64;
const MAX_LAYERS: usize = 16;

/// Errors that can occur during vector index operations
#[derive(Error, Debug, PartialEq)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Index is already at capacity
    #[error("Vector index is full (capacity {0})")]
    CapacityExceeded(usize),
}

/// Nearest-neighbour index over fixed-dimension embeddings
///
/// # Examples
///
/// ```
/// use cyberquery_rag::VectorIndex;
///
/// let mut index = VectorIndex::new(3, 10);
/// index.add(0, &[1.0, 0.0, 0.0]).unwrap();
/// index.add(1, &[0.0, 1.0, 0.0]).unwrap();
///
/// let results = index.search(&[1.0, 0.0, 0.0], 1).unwrap();
/// assert_eq!(results[0].0, 0);
/// ```
pub struct VectorIndex {
    dimension: usize,
    capacity: usize,
    len: usize,
    hnsw: Hnsw<'static, f32, DistCosine>,
}

impl VectorIndex {
    /// Create an index for `capacity` vectors of `dimension` floats
    pub fn new(dimension: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        // Layer count scales with the expected number of elements
        let nb_layer = MAX_LAYERS.min((capacity as f32).ln().trunc() as usize).max(1);

        let hnsw = Hnsw::<'static, f32, DistCosine>::new(
            DEFAULT_M,
            capacity,
            nb_layer,
            DEFAULT_EF_CONSTRUCTION,
            DistCosine {},
        );

        Self {
            dimension,
            capacity,
            len: 0,
            hnsw,
        }
    }

    /// Insert an embedding under `id`
    pub fn add(&mut self, id: usize, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;
        if self.len >= self.capacity {
            return Err(VectorIndexError::CapacityExceeded(self.capacity));
        }

        self.hnsw.insert((embedding, id));
        self.len += 1;
        Ok(())
    }

    /// Find the `k` nearest ids to `query`
    ///
    /// Returns `(id, similarity)` pairs sorted by descending similarity,
    /// where similarity is `1 - cosine distance`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, VectorIndexError> {
        self.check_dimension(query)?;
        if self.len == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let ef_search = k.max(DEFAULT_EF_SEARCH);
        let mut results: Vec<(usize, f32)> = self
            .hnsw
            .search(query, k, ef_search)
            .into_iter()
            .map(|neighbour| (neighbour.d_id, 1.0 - neighbour.distance))
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results.truncate(k);
        Ok(results)
    }

    /// Expected embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors in the index
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("dimension", &self.dimension)
            .field("capacity", &self.capacity)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_index_creation() {
        let index = VectorIndex::new(384, 100);
        assert_eq!(index.dimension(), 384);
        assert!(index.is_empty());
    }

    #[test]
    fn test_add_and_search() {
        let mut index = VectorIndex::new(384, 10);

        let embedding1: Vec<f32> = (0..384).map(|i| (i as f32 + 1.0) / 384.0).collect();
        index.add(7, &embedding1).unwrap();

        let mut embedding2 = embedding1.clone();
        embedding2[0] = -5.0;
        index.add(9, &embedding2).unwrap();

        assert_eq!(index.len(), 2);

        let results = index.search(&embedding1, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 7);
        assert!(results[0].1 > 0.99);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = VectorIndex::new(384, 10);

        let result = index.add(0, &[0.1; 128]);
        assert!(matches!(result, Err(VectorIndexError::DimensionMismatch { expected: 384, actual: 128 })));
        assert!(index.search(&[0.1; 3], 1).is_err());
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut index = VectorIndex::new(2, 1);
        index.add(0, &[1.0, 0.0]).unwrap();
        assert_eq!(index.add(1, &[0.0, 1.0]), Err(VectorIndexError::CapacityExceeded(1)));
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = VectorIndex::new(3, 10);
        assert!(index.search(&[1.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_results_ordered_by_similarity() {
        let mut index = VectorIndex::new(3, 10);
        index.add(0, &[1.0, 0.0, 0.0]).unwrap();
        index.add(1, &[0.0, 1.0, 0.0]).unwrap();
        index.add(2, &[0.7071, 0.7071, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 3).unwrap();

        assert_eq!(results[0].0, 0);
        assert!(results[0].1 > 0.99);

        assert_eq!(results[1].0, 2);
        assert!(results[1].1 > 0.5);

        assert_eq!(results[2].0, 1);
        assert!(results[2].1 < 0.1);
    }

    #[test]
    fn test_k_larger_than_index() {
        let mut index = VectorIndex::new(2, 10);
        index.add(0, &[1.0, 0.0]).unwrap();
        index.add(1, &[0.0, 1.0]).unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 10).unwrap().len(), 2);
    }
}
