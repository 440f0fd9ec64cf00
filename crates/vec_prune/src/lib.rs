/*!
# Vector Pruning

Selects the subset of a scored batch worth indexing.

- **QualityPruner**: keep everything scoring at or above a threshold
- **RedundancyPruner**: keep the `k` best-scored vectors
- **DiversityPruner**: walk vectors best-first, dropping near-duplicates of those already kept

Every pruner returns the kept vectors together with their positions in the
original batch so the caller can drop the matching metadata.
*/

pub mod diversity;
pub mod quality;
pub mod redundancy;

pub use diversity::DiversityPruner;
pub use quality::QualityPruner;
pub use redundancy::RedundancyPruner;

use optimizer_core::{OptError, OptResult, PruneOutcome, PruningConfig, VectorBatch};
use std::cmp::Ordering;
use tracing::warn;

pub trait Pruner {
    /// `scores[i]` belongs to `vectors.row(i)`.
    fn prune(&self, vectors: &VectorBatch, scores: &[f32]) -> OptResult<PruneOutcome>;
}

/// Pruner chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum VectorPruner {
    Quality(QualityPruner),
    Redundancy(RedundancyPruner),
    Diversity(DiversityPruner),
}

impl VectorPruner {
    /// `Ok(None)` when pruning is disabled.
    pub fn from_config(config: &PruningConfig) -> OptResult<Option<Self>> {
        Ok(match *config {
            PruningConfig::None => None,
            PruningConfig::Quality { threshold } => {
                Some(Self::Quality(QualityPruner::new(threshold)?))
            }
            PruningConfig::TopK { k } => Some(Self::Redundancy(RedundancyPruner::new(k))),
            PruningConfig::Diversity {
                similarity_threshold,
            } => Some(Self::Diversity(DiversityPruner::new(similarity_threshold)?)),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Quality(_) => "quality",
            Self::Redundancy(_) => "top_k",
            Self::Diversity(_) => "diversity",
        }
    }
}

impl Pruner for VectorPruner {
    fn prune(&self, vectors: &VectorBatch, scores: &[f32]) -> OptResult<PruneOutcome> {
        match self {
            Self::Quality(p) => p.prune(vectors, scores),
            Self::Redundancy(p) => p.prune(vectors, scores),
            Self::Diversity(p) => p.prune(vectors, scores),
        }
    }
}

/// Reject misaligned or NaN scores before any pruner looks at them.
pub(crate) fn validate_input(vectors: &VectorBatch, scores: &[f32]) -> OptResult<()> {
    if vectors.n_vectors() != scores.len() {
        warn!(
            "Rejecting prune call: {} vectors but {} scores",
            vectors.n_vectors(),
            scores.len()
        );
        return Err(OptError::invalid_input(format!(
            "{} vectors but {} scores",
            vectors.n_vectors(),
            scores.len()
        )));
    }
    if let Some(i) = scores.iter().position(|s| s.is_nan()) {
        warn!("Rejecting prune call: score {} is NaN", i);
        return Err(OptError::invalid_input(format!("score {} is NaN", i)));
    }
    Ok(())
}

/// Indices ordered by score descending, ties by original index ascending.
pub(crate) fn rank_by_score(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| match scores[b].total_cmp(&scores[a]) {
        Ordering::Equal => a.cmp(&b),
        other => other,
    });
    order
}

pub(crate) fn outcome(vectors: &VectorBatch, kept_indices: Vec<usize>) -> OptResult<PruneOutcome> {
    Ok(PruneOutcome {
        kept_vectors: vectors.select(&kept_indices)?,
        kept_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(n: usize) -> VectorBatch {
        let rows: Vec<Vec<f32>> = (0..n).map(|i| vec![i as f32, 1.0]).collect();
        VectorBatch::from_rows(&rows).unwrap()
    }

    fn all_pruners() -> Vec<VectorPruner> {
        vec![
            VectorPruner::Quality(QualityPruner::new(0.5).unwrap()),
            VectorPruner::Redundancy(RedundancyPruner::new(3)),
            VectorPruner::Diversity(DiversityPruner::new(0.9).unwrap()),
        ]
    }

    #[test]
    fn test_rank_ties_by_index() {
        assert_eq!(rank_by_score(&[0.5, 0.9, 0.5, 0.1]), vec![1, 0, 2, 3]);
        assert!(rank_by_score(&[]).is_empty());
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        for pruner in all_pruners() {
            let out = pruner.prune(&VectorBatch::empty(2), &[]).unwrap();
            assert!(out.is_empty(), "{} returned vectors", pruner.name());
            assert!(out.kept_vectors.is_empty());
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        for pruner in all_pruners() {
            let err = pruner.prune(&batch(3), &[1.0, 2.0]).unwrap_err();
            assert!(matches!(err, OptError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_nan_scores_rejected() {
        for pruner in all_pruners() {
            assert!(pruner.prune(&batch(2), &[1.0, f32::NAN]).is_err());
        }
    }

    #[test]
    fn test_outcome_alignment() {
        let vectors = batch(5);
        let scores = [0.9, 0.1, 0.7, 0.6, 0.95];
        for pruner in all_pruners() {
            let out = pruner.prune(&vectors, &scores).unwrap();
            assert_eq!(out.kept_vectors.n_vectors(), out.kept_indices.len());
            for (j, &i) in out.kept_indices.iter().enumerate() {
                assert_eq!(out.kept_vectors.row(j), vectors.row(i));
            }
        }
    }

    #[test]
    fn test_from_config() {
        assert!(VectorPruner::from_config(&PruningConfig::None).unwrap().is_none());
        let pruner = VectorPruner::from_config(&PruningConfig::TopK { k: 2 })
            .unwrap()
            .unwrap();
        assert_eq!(pruner.name(), "top_k");
        assert!(VectorPruner::from_config(&PruningConfig::Quality {
            threshold: f32::NAN
        })
        .is_err());
    }
}
