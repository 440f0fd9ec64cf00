use crate::pipeline::{IndexPayload, OptimizationPipeline, StoredVectors};
use optimizer_core::{OptResult, OptimizerConfig, VectorBatch};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle that serializes access to one pipeline across tasks.
///
/// Every call takes the lock for its whole duration, so cache bookkeeping and
/// the compressor's one-time fit are never interleaved.
pub struct SharedPipeline<Q = serde_json::Value, R = serde_json::Value> {
    inner: Arc<Mutex<OptimizationPipeline<Q, R>>>,
}

impl<Q, R> Clone for SharedPipeline<Q, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Q: Clone, R: Clone> SharedPipeline<Q, R> {
    pub fn new(config: &OptimizerConfig) -> OptResult<Self> {
        Ok(Self::from_pipeline(OptimizationPipeline::new(config)?))
    }

    pub fn from_pipeline(pipeline: OptimizationPipeline<Q, R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pipeline)),
        }
    }

    pub async fn embedding_for<F>(&self, text: &str, producer: F) -> OptResult<Vec<f32>>
    where
        F: FnOnce(&str) -> OptResult<Vec<f32>>,
    {
        self.inner.lock().await.embedding_for(text, producer)
    }

    pub async fn cached_query(&self, query: &str) -> Option<Q> {
        self.inner.lock().await.cached_query(query)
    }

    pub async fn store_query(&self, query: &str, value: Q) {
        self.inner.lock().await.store_query(query, value)
    }

    pub async fn cached_result<S: AsRef<str>>(&self, parts: &[S]) -> Option<R> {
        self.inner.lock().await.cached_result(parts)
    }

    pub async fn store_result<S: AsRef<str>>(&self, parts: &[S], value: R) {
        self.inner.lock().await.store_result(parts, value)
    }

    pub async fn prepare_for_index(&self, batch: &VectorBatch, scores: &[f32]) -> OptResult<IndexPayload> {
        self.inner.lock().await.prepare_for_index(batch, scores)
    }

    pub async fn restore(&self, stored: &StoredVectors) -> OptResult<VectorBatch> {
        self.inner.lock().await.restore(stored)
    }

    pub async fn report(&self) -> serde_json::Value {
        self.inner.lock().await.report()
    }
}
