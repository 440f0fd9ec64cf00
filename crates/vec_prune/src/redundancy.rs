use crate::{outcome, rank_by_score, validate_input, Pruner};
use optimizer_core::{OptResult, PruneOutcome, VectorBatch};
use tracing::debug;

/// Keeps the `k` highest-scoring vectors.
///
/// Despite the name this is a plain top-K selector: it never compares
/// vectors with each other. Similarity-based de-duplication lives in
/// [`crate::DiversityPruner`]. Kept indices come back best-first, ties
/// broken by original index ascending.
#[derive(Debug, Clone)]
pub struct RedundancyPruner {
    k: usize,
}

impl RedundancyPruner {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl Pruner for RedundancyPruner {
    fn prune(&self, vectors: &VectorBatch, scores: &[f32]) -> OptResult<PruneOutcome> {
        validate_input(vectors, scores)?;

        let mut kept = rank_by_score(scores);
        kept.truncate(self.k);

        debug!("Top-{} pruning: kept {} of {}", self.k, kept.len(), scores.len());
        outcome(vectors, kept)
    }
}
