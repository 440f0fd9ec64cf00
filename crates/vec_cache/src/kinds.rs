use crate::cache::Cache;
use crate::clock::SystemClock;
use optimizer_core::CacheConfig;

/// Embeddings keyed by a content hash of the embedded text.
pub type EmbeddingCache<C = SystemClock> = Cache<String, Vec<f32>, C>;

/// Retrieval results keyed by the verbatim query string.
pub type QueryCache<V, C = SystemClock> = Cache<String, V, C>;

/// Derived artifacts keyed by a composite cache key.
pub type ResultCache<V, C = SystemClock> = Cache<String, V, C>;

/// The three cache roles in the pipeline and their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Embedding,
    Query,
    Result,
}

impl CacheKind {
    pub fn default_config(self) -> CacheConfig {
        match self {
            Self::Embedding => CacheConfig::embedding(),
            Self::Query => CacheConfig::query(),
            Self::Result => CacheConfig::result(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Embedding => "embedding_cache",
            Self::Query => "query_cache",
            Self::Result => "result_cache",
        }
    }
}
