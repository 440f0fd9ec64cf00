use crate::{outcome, rank_by_score, validate_input, Pruner};
use nalgebra::DMatrix;
use optimizer_core::{OptError, OptResult, PruneOutcome, VectorBatch};
use tracing::{debug, warn};

/// Drops near-duplicates, keeping the better-scored copy.
///
/// Vectors are visited best score first. A vector is kept unless its cosine
/// similarity to some already-kept vector is strictly greater than
/// `similarity_threshold`. The top-ranked vector is therefore always kept.
/// Zero vectors have similarity 0 to everything. Batches with NaN or infinite
/// components are rejected.
#[derive(Debug, Clone)]
pub struct DiversityPruner {
    similarity_threshold: f32,
}

impl DiversityPruner {
    pub fn new(similarity_threshold: f32) -> OptResult<Self> {
        if !similarity_threshold.is_finite() {
            return Err(OptError::invalid_input(
                "similarity_threshold must be finite",
            ));
        }
        Ok(Self {
            similarity_threshold,
        })
    }

    pub fn similarity_threshold(&self) -> f32 {
        self.similarity_threshold
    }
}

impl Pruner for DiversityPruner {
    fn prune(&self, vectors: &VectorBatch, scores: &[f32]) -> OptResult<PruneOutcome> {
        validate_input(vectors, scores)?;
        if vectors.is_empty() {
            return Ok(PruneOutcome::empty(vectors.n_dimensions()));
        }
        if !vectors.all_finite() {
            warn!("Diversity pruning rejected a batch with non-finite components");
            return Err(OptError::invalid_input("vectors must be finite"));
        }

        let similarity = cosine_similarity_matrix(vectors);
        let threshold = self.similarity_threshold as f64;

        let mut kept: Vec<usize> = Vec::new();
        for candidate in rank_by_score(scores) {
            let duplicate = kept
                .iter()
                .any(|&k| similarity[(candidate, k)] > threshold);
            if !duplicate {
                kept.push(candidate);
            }
        }

        debug!(
            "Diversity pruning at {}: kept {} of {}",
            self.similarity_threshold,
            kept.len(),
            scores.len()
        );
        outcome(vectors, kept)
    }
}

/// Pairwise cosine similarities of the L2-normalized rows.
fn cosine_similarity_matrix(vectors: &VectorBatch) -> DMatrix<f64> {
    let n = vectors.n_vectors();
    let d = vectors.n_dimensions();
    let data = vectors.as_slice();

    let norms: Vec<f64> = vectors
        .rows()
        .map(|row| row.iter().map(|&v| (v as f64) * (v as f64)).sum::<f64>().sqrt())
        .collect();
    let normalized = DMatrix::from_fn(n, d, |i, j| {
        if norms[i] > 0.0 {
            data[i * d + j] as f64 / norms[i]
        } else {
            0.0
        }
    });

    &normalized * normalized.transpose()
}
