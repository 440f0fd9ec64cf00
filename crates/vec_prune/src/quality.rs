use crate::{outcome, validate_input, Pruner};
use optimizer_core::{OptError, OptResult, PruneOutcome, VectorBatch};
use tracing::debug;

/// Keeps every vector whose score is at least `threshold`.
///
/// Kept indices stay in original batch order. `-inf` keeps everything and
/// `+inf` keeps nothing.
#[derive(Debug, Clone)]
pub struct QualityPruner {
    threshold: f32,
}

impl QualityPruner {
    pub fn new(threshold: f32) -> OptResult<Self> {
        if threshold.is_nan() {
            return Err(OptError::invalid_input("quality threshold must not be NaN"));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Pruner for QualityPruner {
    fn prune(&self, vectors: &VectorBatch, scores: &[f32]) -> OptResult<PruneOutcome> {
        validate_input(vectors, scores)?;

        let kept: Vec<usize> = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| **s >= self.threshold)
            .map(|(i, _)| i)
            .collect();

        debug!(
            "Quality pruning at {}: kept {} of {}",
            self.threshold,
            kept.len(),
            scores.len()
        );
        outcome(vectors, kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors() -> VectorBatch {
        VectorBatch::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0], vec![2.0, 2.0]]).unwrap()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let pruner = QualityPruner::new(0.5).unwrap();
        let out = pruner.prune(&vectors(), &[0.2, 0.5, 0.9, 0.49]).unwrap();
        assert_eq!(out.kept_indices, vec![1, 2]);
        assert_eq!(out.kept_vectors.to_rows(), vec![vec![0.0, 1.0], vec![1.0, 1.0]]);
    }

    #[test]
    fn test_infinite_thresholds() {
        let scores = [0.3, -4.0, 12.0, 0.0];
        let keep_all = QualityPruner::new(f32::NEG_INFINITY).unwrap();
        assert_eq!(keep_all.prune(&vectors(), &scores).unwrap().kept_indices, vec![0, 1, 2, 3]);

        let keep_none = QualityPruner::new(f32::INFINITY).unwrap();
        let out = keep_none.prune(&vectors(), &scores).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.kept_vectors.n_dimensions(), 2);
    }

    #[test]
    fn test_nan_threshold_rejected() {
        assert!(QualityPruner::new(f32::NAN).is_err());
    }
}
