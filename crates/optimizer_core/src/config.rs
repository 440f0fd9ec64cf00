use crate::errors::{OptError, OptResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::error;

/// Top-level configuration for the optimization pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub compression: CompressionConfig,
    pub pruning: PruningConfig,
    pub caches: CachesConfig,
}

/// Which compressor, if any, shrinks vectors before they are indexed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompressionConfig {
    #[default]
    None,
    Pca { n_components: usize },
    Quantization { bits: u8 },
}

/// Which pruner, if any, drops vectors before they are indexed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PruningConfig {
    #[default]
    None,
    Quality { threshold: f32 },
    TopK { k: usize },
    Diversity { similarity_threshold: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub capacity: usize,
    /// Entry lifetime in seconds; `None` disables expiry
    pub ttl_seconds: Option<u64>,
}

impl CacheConfig {
    pub fn embedding() -> Self {
        Self {
            capacity: 10_000,
            ttl_seconds: None,
        }
    }

    pub fn query() -> Self {
        Self {
            capacity: 1_000,
            ttl_seconds: Some(3600), // 1 hour
        }
    }

    pub fn result() -> Self {
        Self {
            capacity: 500,
            ttl_seconds: Some(300), // 5 minutes
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000,
            ttl_seconds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachesConfig {
    pub embedding: CacheConfig,
    pub query: CacheConfig,
    pub result: CacheConfig,
}

impl Default for CachesConfig {
    fn default() -> Self {
        Self {
            embedding: CacheConfig::embedding(),
            query: CacheConfig::query(),
            result: CacheConfig::result(),
        }
    }
}

impl OptimizerConfig {
    pub fn from_json_str(json: &str) -> OptResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> OptResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> OptResult<()> {
        match self.compression {
            CompressionConfig::Pca { n_components: 0 } => {
                return Err(config_error("n_components must be at least 1"));
            }
            CompressionConfig::Quantization { bits } if !(1..=16).contains(&bits) => {
                return Err(config_error(&format!("bits must be in 1..=16, got {}", bits)));
            }
            _ => {}
        }

        match self.pruning {
            PruningConfig::Quality { threshold } if threshold.is_nan() => {
                return Err(config_error("quality threshold must not be NaN"));
            }
            PruningConfig::Diversity {
                similarity_threshold,
            } if !similarity_threshold.is_finite() => {
                return Err(config_error("similarity_threshold must be finite"));
            }
            _ => {}
        }

        for (name, cache) in [
            ("embedding", &self.caches.embedding),
            ("query", &self.caches.query),
            ("result", &self.caches.result),
        ] {
            if cache.capacity == 0 {
                return Err(config_error(&format!("{} cache capacity cannot be 0", name)));
            }
        }

        Ok(())
    }
}

fn config_error(message: &str) -> OptError {
    error!("OptimizerConfig error: {}", message);
    OptError::config(message)
}
