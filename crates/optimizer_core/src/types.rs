use crate::errors::{OptError, OptResult};
use serde::{Deserialize, Serialize};

/// A dense `n_vectors × n_dimensions` matrix of embeddings, stored row-major.
///
/// Every row shares the same dimensionality. An empty batch is valid and
/// keeps whatever `n_dimensions` it was created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorBatch {
    n_dimensions: usize,
    data: Vec<f32>,
}

impl VectorBatch {
    /// Build a batch from a flat row-major buffer.
    pub fn new(n_dimensions: usize, data: Vec<f32>) -> OptResult<Self> {
        if n_dimensions == 0 && !data.is_empty() {
            return Err(OptError::invalid_input(
                "zero-dimensional batch cannot hold values",
            ));
        }
        if n_dimensions > 0 && data.len() % n_dimensions != 0 {
            return Err(OptError::invalid_input(format!(
                "buffer of {} values is not a multiple of {} dimensions",
                data.len(),
                n_dimensions
            )));
        }
        Ok(Self { n_dimensions, data })
    }

    /// Build a batch from individual vectors, rejecting ragged input.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> OptResult<Self> {
        let n_dimensions = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * n_dimensions);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n_dimensions {
                return Err(OptError::invalid_input(format!(
                    "vector {} has {} dimensions, expected {}",
                    i,
                    row.len(),
                    n_dimensions
                )));
            }
            data.extend_from_slice(row);
        }
        Self::new(n_dimensions, data)
    }

    pub fn empty(n_dimensions: usize) -> Self {
        Self {
            n_dimensions,
            data: Vec::new(),
        }
    }

    pub fn n_vectors(&self) -> usize {
        if self.n_dimensions == 0 {
            0
        } else {
            self.data.len() / self.n_dimensions
        }
    }

    pub fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }

    pub fn is_empty(&self) -> bool {
        self.n_vectors() == 0
    }

    /// Row `i`, or `None` when out of range.
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.n_vectors() {
            return None;
        }
        let start = i * self.n_dimensions;
        Some(&self.data[start..start + self.n_dimensions])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on 0, and a zero-width batch has no rows anyway
        self.data.chunks_exact(self.n_dimensions.max(1))
    }

    /// Gather the given rows, in the given order, into a new batch.
    pub fn select(&self, indices: &[usize]) -> OptResult<Self> {
        let mut data = Vec::with_capacity(indices.len() * self.n_dimensions);
        for &i in indices {
            let row = self.row(i).ok_or_else(|| {
                OptError::invalid_input(format!(
                    "index {} out of range for batch of {} vectors",
                    i,
                    self.n_vectors()
                ))
            })?;
            data.extend_from_slice(row);
        }
        Ok(Self {
            n_dimensions: self.n_dimensions,
            data,
        })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.rows().map(|r| r.to_vec()).collect()
    }

    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

/// Result of pruning a scored batch.
///
/// `kept_indices[j]` is the position in the original batch of
/// `kept_vectors.row(j)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneOutcome {
    pub kept_vectors: VectorBatch,
    pub kept_indices: Vec<usize>,
}

impl PruneOutcome {
    pub fn empty(n_dimensions: usize) -> Self {
        Self {
            kept_vectors: VectorBatch::empty(n_dimensions),
            kept_indices: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.kept_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept_indices.is_empty()
    }
}
