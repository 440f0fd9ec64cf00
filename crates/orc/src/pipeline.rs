use crypto::CryptoUtils;
use optimizer_core::{OptError, OptResult, OptimizerConfig, PruneOutcome, VectorBatch};
use serde::{Deserialize, Serialize};
use telemetry::TelemetrySystem;
use tracing::{debug, info};
use vec_cache::{CacheKind, CacheStats, EmbeddingCache, QueryCache, ResultCache};
use vec_compress::{CompressedBatch, Compressor, VectorCompressor};
use vec_prune::{Pruner, VectorPruner};

/// Vectors as handed to the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoredVectors {
    Raw(VectorBatch),
    Compressed(CompressedBatch),
}

impl StoredVectors {
    pub fn n_vectors(&self) -> usize {
        match self {
            Self::Raw(batch) => batch.n_vectors(),
            Self::Compressed(batch) => batch.n_vectors(),
        }
    }
}

/// What survives optimization: positions in the input batch plus the
/// (possibly compressed) vectors in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPayload {
    pub kept_indices: Vec<usize>,
    pub vectors: StoredVectors,
}

/// Caches, pruner and compressor for one indexing / query process.
///
/// Not synchronized; see [`crate::SharedPipeline`] for async callers.
pub struct OptimizationPipeline<Q = serde_json::Value, R = serde_json::Value> {
    embeddings: EmbeddingCache,
    queries: QueryCache<Q>,
    results: ResultCache<R>,
    pruner: Option<VectorPruner>,
    compressor: Option<VectorCompressor>,
    telemetry: TelemetrySystem,
}

impl<Q: Clone, R: Clone> OptimizationPipeline<Q, R> {
    pub fn new(config: &OptimizerConfig) -> OptResult<Self> {
        config.validate()?;

        let pipeline = Self {
            embeddings: EmbeddingCache::from_config(&config.caches.embedding)?
                .named(CacheKind::Embedding.name()),
            queries: QueryCache::from_config(&config.caches.query)?.named(CacheKind::Query.name()),
            results: ResultCache::from_config(&config.caches.result)?
                .named(CacheKind::Result.name()),
            pruner: VectorPruner::from_config(&config.pruning)?,
            compressor: VectorCompressor::from_config(&config.compression)?,
            telemetry: TelemetrySystem::new(),
        };

        info!(
            "Optimization pipeline ready: pruner={}, compressor={}",
            pipeline.pruner.as_ref().map_or("none", |p| p.name()),
            pipeline.compressor.as_ref().map_or("none", |c| c.name())
        );
        Ok(pipeline)
    }

    /// Cached embedding for `text`, calling `producer` only on a miss.
    pub fn embedding_for<F>(&mut self, text: &str, producer: F) -> OptResult<Vec<f32>>
    where
        F: FnOnce(&str) -> OptResult<Vec<f32>>,
    {
        let key = CryptoUtils::content_key(text);
        if let Some(embedding) = self.embeddings.get(&key) {
            self.telemetry.record_counter("cache.embedding.hits", 1.0);
            return Ok(embedding);
        }

        self.telemetry.record_counter("cache.embedding.misses", 1.0);
        let embedding = producer(text)?;
        self.embeddings.set(key, embedding.clone());
        Ok(embedding)
    }

    pub fn cached_query(&mut self, query: &str) -> Option<Q> {
        let hit = self.queries.get(query);
        let name = if hit.is_some() {
            "cache.query.hits"
        } else {
            "cache.query.misses"
        };
        self.telemetry.record_counter(name, 1.0);
        hit
    }

    pub fn store_query(&mut self, query: &str, value: Q) {
        self.queries.set(query.to_string(), value);
    }

    pub fn cached_result<S: AsRef<str>>(&mut self, parts: &[S]) -> Option<R> {
        let hit = self.results.get(&CryptoUtils::composite_key(parts));
        let name = if hit.is_some() {
            "cache.result.hits"
        } else {
            "cache.result.misses"
        };
        self.telemetry.record_counter(name, 1.0);
        hit
    }

    pub fn store_result<S: AsRef<str>>(&mut self, parts: &[S], value: R) {
        self.results.set(CryptoUtils::composite_key(parts), value);
    }

    /// Prune, then compress, a scored batch on its way to the vector store.
    ///
    /// The first compressed batch fits the compressor; an empty survivor set
    /// is passed through raw so it never triggers a fit.
    pub fn prepare_for_index(&mut self, batch: &VectorBatch, scores: &[f32]) -> OptResult<IndexPayload> {
        let PruneOutcome {
            kept_vectors,
            kept_indices,
        } = match &self.pruner {
            Some(pruner) => pruner.prune(batch, scores)?,
            None => {
                if batch.n_vectors() != scores.len() {
                    return Err(OptError::invalid_input(format!(
                        "{} vectors but {} scores",
                        batch.n_vectors(),
                        scores.len()
                    )));
                }
                PruneOutcome {
                    kept_vectors: batch.clone(),
                    kept_indices: (0..batch.n_vectors()).collect(),
                }
            }
        };

        let dropped = batch.n_vectors() - kept_indices.len();
        self.telemetry.record_counter("prune.kept", kept_indices.len() as f64);
        self.telemetry.record_counter("prune.dropped", dropped as f64);

        let vectors = match self.compressor.as_mut() {
            Some(compressor) if !kept_vectors.is_empty() => {
                let compressed = compressor.compress(&kept_vectors)?;
                self.telemetry.record_counter("compress.batches", 1.0);
                if let Some(ratio) = compressor.compression_ratio() {
                    self.telemetry.record_gauge("compress.ratio", ratio);
                }
                StoredVectors::Compressed(compressed)
            }
            _ => StoredVectors::Raw(kept_vectors),
        };

        debug!(
            "Prepared batch for index: kept {} of {} vectors",
            kept_indices.len(),
            batch.n_vectors()
        );
        Ok(IndexPayload {
            kept_indices,
            vectors,
        })
    }

    /// Full-width vectors back from what `prepare_for_index` produced.
    pub fn restore(&self, stored: &StoredVectors) -> OptResult<VectorBatch> {
        match stored {
            StoredVectors::Raw(batch) => Ok(batch.clone()),
            StoredVectors::Compressed(batch) => match &self.compressor {
                Some(compressor) => compressor.decompress(batch),
                None => Err(OptError::invalid_input(
                    "pipeline has no compressor to restore compressed vectors",
                )),
            },
        }
    }

    pub fn cache_stats(&self, kind: CacheKind) -> CacheStats {
        match kind {
            CacheKind::Embedding => self.embeddings.stats(),
            CacheKind::Query => self.queries.stats(),
            CacheKind::Result => self.results.stats(),
        }
    }

    pub fn clear_caches(&mut self) {
        self.embeddings.clear();
        self.queries.clear();
        self.results.clear();
    }

    pub fn compressor(&self) -> Option<&VectorCompressor> {
        self.compressor.as_ref()
    }

    pub fn telemetry(&self) -> &TelemetrySystem {
        &self.telemetry
    }

    /// Refresh cache gauges and return every metric as JSON.
    pub fn report(&mut self) -> serde_json::Value {
        for kind in [CacheKind::Embedding, CacheKind::Query, CacheKind::Result] {
            let stats = self.cache_stats(kind);
            self.telemetry
                .record_gauge(&format!("{}.hit_rate", kind.name()), stats.hit_rate());
            self.telemetry
                .record_gauge(&format!("{}.len", kind.name()), stats.len as f64);
            self.telemetry
                .record_gauge(&format!("{}.evictions", kind.name()), stats.evictions as f64);
        }
        self.telemetry.snapshot()
    }
}
