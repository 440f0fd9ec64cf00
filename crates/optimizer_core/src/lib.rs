/*!
# Optimizer Core

Shared building blocks for the vector optimization engine:

- **VectorBatch**: dense row-major matrix of embeddings
- **Errors**: the `OptError` taxonomy shared by compression, pruning and caching
- **Config**: serde-backed configuration for the whole pipeline
*/

pub mod config;
pub mod errors;
pub mod types;

pub use config::{CacheConfig, CachesConfig, CompressionConfig, OptimizerConfig, PruningConfig};
pub use errors::{ErrorCode, ErrorSeverity, OptError, OptResult};
pub use types::{PruneOutcome, VectorBatch};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
