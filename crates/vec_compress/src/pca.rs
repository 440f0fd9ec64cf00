use crate::state::CompressorState;
use crate::Compressor;
use nalgebra::{DMatrix, DVector};
use optimizer_core::{OptError, OptResult, VectorBatch};
use tracing::debug;

/// Fitted PCA transform: column means plus the top right-singular vectors of
/// the centered fitting batch, one per row of `basis`.
#[derive(Debug, Clone)]
pub struct PcaParams {
    mean: DVector<f64>,
    /// `n_components × n_dimensions`, rows ordered by singular value, descending
    basis: DMatrix<f64>,
    explained_variance_ratio: f64,
}

impl PcaParams {
    fn fit(batch: &VectorBatch, n_components: usize) -> OptResult<Self> {
        let n = batch.n_vectors();
        let d = batch.n_dimensions();
        if n == 0 || d == 0 {
            return Err(OptError::invalid_input(
                "cannot fit PCA on an empty batch",
            ));
        }
        if !batch.all_finite() {
            return Err(OptError::invalid_input(
                "cannot fit PCA on a batch containing NaN or infinite values",
            ));
        }
        if n_components > n.min(d) {
            return Err(OptError::invalid_input(format!(
                "n_components {} exceeds min(n_vectors, n_dimensions) = {}",
                n_components,
                n.min(d)
            )));
        }

        let x = to_matrix(batch);
        let mean = DVector::from_fn(d, |j, _| x.column(j).mean());
        let centered = DMatrix::from_fn(n, d, |i, j| x[(i, j)] - mean[j]);

        let svd = centered.svd(false, true);
        let v_t = svd
            .v_t
            .ok_or_else(|| OptError::invalid_input("SVD did not produce right-singular vectors"))?;
        let singular = svd.singular_values;

        let mut order: Vec<usize> = (0..singular.len()).collect();
        order.sort_by(|&a, &b| singular[b].total_cmp(&singular[a]));
        let basis = DMatrix::from_fn(n_components, d, |r, j| v_t[(order[r], j)]);

        let total: f64 = singular.iter().map(|s| s * s).sum();
        let kept: f64 = order[..n_components]
            .iter()
            .map(|&i| singular[i] * singular[i])
            .sum();
        let explained_variance_ratio = if total > 0.0 { kept / total } else { 1.0 };

        debug!(
            "Fitted PCA on {} vectors: {} -> {} dimensions, explained variance {:.4}",
            n, d, n_components, explained_variance_ratio
        );

        Ok(Self {
            mean,
            basis,
            explained_variance_ratio,
        })
    }

    pub fn n_dimensions(&self) -> usize {
        self.basis.ncols()
    }

    pub fn n_components(&self) -> usize {
        self.basis.nrows()
    }

    pub fn mean(&self) -> &[f64] {
        self.mean.as_slice()
    }

    pub fn basis(&self) -> &DMatrix<f64> {
        &self.basis
    }
}

/// PCA-based dimensionality reduction, e.g. 1536 -> 128 dimensions.
#[derive(Debug, Clone)]
pub struct DimensionalityReducer {
    n_components: usize,
    state: CompressorState<PcaParams>,
}

impl DimensionalityReducer {
    pub fn new(n_components: usize) -> OptResult<Self> {
        if n_components == 0 {
            return Err(OptError::invalid_input("n_components must be at least 1"));
        }
        Ok(Self {
            n_components,
            state: CompressorState::Unfitted,
        })
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn params(&self) -> Option<&PcaParams> {
        self.state.params()
    }

    /// Share of the fitting batch's variance captured by the basis.
    pub fn explained_variance_ratio(&self) -> Option<f64> {
        self.params().map(|p| p.explained_variance_ratio)
    }

    pub fn compression_ratio(&self) -> Option<f64> {
        self.params()
            .map(|p| p.n_dimensions() as f64 / p.n_components() as f64)
    }
}

impl Compressor for DimensionalityReducer {
    type Compressed = VectorBatch;

    fn compress(&mut self, batch: &VectorBatch) -> OptResult<VectorBatch> {
        let n_components = self.n_components;
        let params = self.state.fit_once(|| PcaParams::fit(batch, n_components))?;

        if batch.n_dimensions() != params.n_dimensions() {
            return Err(OptError::invalid_input(format!(
                "batch has {} dimensions, reducer was fitted on {}",
                batch.n_dimensions(),
                params.n_dimensions()
            )));
        }
        if batch.is_empty() {
            return Ok(VectorBatch::empty(params.n_components()));
        }
        if !batch.all_finite() {
            return Err(OptError::invalid_input(
                "cannot project NaN or infinite values",
            ));
        }

        let x = to_matrix(batch);
        let centered = DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] - params.mean[j]);
        let projected = centered * params.basis.transpose();
        from_matrix(&projected)
    }

    fn decompress(&self, compressed: &VectorBatch) -> OptResult<VectorBatch> {
        let params = self.state.fitted("DimensionalityReducer")?;
        if compressed.n_dimensions() != params.n_components() {
            return Err(OptError::invalid_input(format!(
                "compressed batch has {} components, reducer produces {}",
                compressed.n_dimensions(),
                params.n_components()
            )));
        }
        if compressed.is_empty() {
            return Ok(VectorBatch::empty(params.n_dimensions()));
        }

        let y = to_matrix(compressed);
        let mut restored = y * &params.basis;
        for mut row in restored.row_iter_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value += params.mean[j];
            }
        }
        from_matrix(&restored)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}

fn to_matrix(batch: &VectorBatch) -> DMatrix<f64> {
    let d = batch.n_dimensions();
    let data = batch.as_slice();
    DMatrix::from_fn(batch.n_vectors(), d, |i, j| data[i * d + j] as f64)
}

fn from_matrix(m: &DMatrix<f64>) -> OptResult<VectorBatch> {
    let mut data = Vec::with_capacity(m.nrows() * m.ncols());
    for row in m.row_iter() {
        data.extend(row.iter().map(|&v| v as f32));
    }
    VectorBatch::new(m.ncols(), data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlated_batch() -> VectorBatch {
        // points near the line y = 2x, z = -x, with a little noise on y
        let rows: Vec<Vec<f32>> = (0..12)
            .map(|i| {
                let x = i as f32 - 5.5;
                let noise = if i % 2 == 0 { 0.05 } else { -0.05 };
                vec![x, 2.0 * x + noise, -x]
            })
            .collect();
        VectorBatch::from_rows(&rows).unwrap()
    }

    fn max_abs_diff(a: &VectorBatch, b: &VectorBatch) -> f32 {
        a.as_slice()
            .iter()
            .zip(b.as_slice())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_full_rank_reconstruction_is_lossless() {
        let batch = correlated_batch();
        let mut reducer = DimensionalityReducer::new(3).unwrap();
        let compressed = reducer.compress(&batch).unwrap();
        assert_eq!(compressed.n_dimensions(), 3);
        let restored = reducer.decompress(&compressed).unwrap();
        assert!(max_abs_diff(&batch, &restored) < 1e-4);
    }

    #[test]
    fn test_reduction_keeps_dominant_direction() {
        let batch = correlated_batch();
        let mut reducer = DimensionalityReducer::new(1).unwrap();
        let compressed = reducer.compress(&batch).unwrap();
        assert_eq!(compressed.n_dimensions(), 1);
        assert_eq!(compressed.n_vectors(), 12);

        let ratio = reducer.explained_variance_ratio().unwrap();
        assert!(ratio > 0.99, "explained variance was {}", ratio);
        assert_eq!(reducer.compression_ratio(), Some(3.0));

        let restored = reducer.decompress(&compressed).unwrap();
        assert!(max_abs_diff(&batch, &restored) < 0.1);
    }

    #[test]
    fn test_decompress_before_compress_fails() {
        let reducer = DimensionalityReducer::new(2).unwrap();
        let compressed = VectorBatch::from_rows(&[vec![0.0, 0.0]]).unwrap();
        assert!(matches!(
            reducer.decompress(&compressed),
            Err(OptError::NotFitted(_))
        ));
    }

    #[test]
    fn test_never_refits() {
        let mut reducer = DimensionalityReducer::new(1).unwrap();
        reducer.compress(&correlated_batch()).unwrap();
        let mean_before = reducer.params().unwrap().mean().to_vec();

        let shifted = VectorBatch::from_rows(&[vec![100.0, 0.0, 5.0], vec![-40.0, 3.0, 1.0]]).unwrap();
        reducer.compress(&shifted).unwrap();
        assert_eq!(reducer.params().unwrap().mean(), mean_before.as_slice());
    }

    #[test]
    fn test_degenerate_inputs_rejected() {
        let mut reducer = DimensionalityReducer::new(2).unwrap();
        assert!(matches!(
            reducer.compress(&VectorBatch::empty(4)),
            Err(OptError::InvalidInput(_))
        ));
        assert!(!reducer.is_fitted());

        // one vector cannot supply two components
        let single = VectorBatch::from_rows(&[vec![1.0, 2.0, 3.0]]).unwrap();
        assert!(reducer.compress(&single).is_err());

        let with_nan = VectorBatch::from_rows(&[vec![1.0, f32::NAN], vec![0.0, 1.0]]).unwrap();
        assert!(reducer.compress(&with_nan).is_err());

        assert!(DimensionalityReducer::new(0).is_err());
    }

    #[test]
    fn test_dimension_mismatch_after_fit() {
        let mut reducer = DimensionalityReducer::new(2).unwrap();
        reducer.compress(&correlated_batch()).unwrap();
        let wrong = VectorBatch::from_rows(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            reducer.compress(&wrong),
            Err(OptError::InvalidInput(_))
        ));
        let wrong_width = VectorBatch::from_rows(&[vec![1.0, 2.0, 3.0]]).unwrap();
        assert!(reducer.decompress(&wrong_width).is_err());
    }
}
