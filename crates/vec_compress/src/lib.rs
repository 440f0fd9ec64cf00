/*!
# Vector Compression

Lossy compression of embedding batches before they reach the vector store.

- **DimensionalityReducer**: PCA projection onto the top principal directions
- **QuantizationCompressor**: per-dimension linear quantization to `bits`-wide integers

Both fit their parameters exactly once, on the first `compress` call, so every
batch processed afterwards lands in the same coordinate space.
*/

pub mod pca;
pub mod quantization;
pub mod state;

pub use pca::{DimensionalityReducer, PcaParams};
pub use quantization::{QuantizationCompressor, QuantizationParams, QuantizedBatch, QuantizedCodes};
pub use state::CompressorState;

use optimizer_core::{CompressionConfig, OptResult, VectorBatch};
use serde::{Deserialize, Serialize};

/// Lossy, fit-once transform between full vectors and a compact representation.
pub trait Compressor {
    type Compressed;

    /// Compress a batch, fitting the transform first if this is the first call.
    fn compress(&mut self, batch: &VectorBatch) -> OptResult<Self::Compressed>;

    /// Approximate reconstruction. Fails with `NotFitted` before any `compress`.
    fn decompress(&self, compressed: &Self::Compressed) -> OptResult<VectorBatch>;

    fn is_fitted(&self) -> bool;
}

/// Output of a [`VectorCompressor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompressedBatch {
    Projected(VectorBatch),
    Quantized(QuantizedBatch),
}

impl CompressedBatch {
    pub fn n_vectors(&self) -> usize {
        match self {
            Self::Projected(batch) => batch.n_vectors(),
            Self::Quantized(batch) => batch.n_vectors(),
        }
    }
}

/// Compressor chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum VectorCompressor {
    Pca(DimensionalityReducer),
    Quantization(QuantizationCompressor),
}

impl VectorCompressor {
    /// `Ok(None)` when compression is disabled.
    pub fn from_config(config: &CompressionConfig) -> OptResult<Option<Self>> {
        Ok(match *config {
            CompressionConfig::None => None,
            CompressionConfig::Pca { n_components } => {
                Some(Self::Pca(DimensionalityReducer::new(n_components)?))
            }
            CompressionConfig::Quantization { bits } => {
                Some(Self::Quantization(QuantizationCompressor::new(bits)?))
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pca(_) => "pca",
            Self::Quantization(_) => "quantization",
        }
    }

    /// Bytes per stored vector before / after compression, once fitted.
    pub fn compression_ratio(&self) -> Option<f64> {
        match self {
            Self::Pca(c) => c.compression_ratio(),
            Self::Quantization(c) => c.compression_ratio(),
        }
    }
}

impl Compressor for VectorCompressor {
    type Compressed = CompressedBatch;

    fn compress(&mut self, batch: &VectorBatch) -> OptResult<CompressedBatch> {
        match self {
            Self::Pca(c) => c.compress(batch).map(CompressedBatch::Projected),
            Self::Quantization(c) => c.compress(batch).map(CompressedBatch::Quantized),
        }
    }

    fn decompress(&self, compressed: &CompressedBatch) -> OptResult<VectorBatch> {
        match (self, compressed) {
            (Self::Pca(c), CompressedBatch::Projected(batch)) => c.decompress(batch),
            (Self::Quantization(c), CompressedBatch::Quantized(batch)) => c.decompress(batch),
            (this, _) => Err(optimizer_core::OptError::invalid_input(format!(
                "{} compressor cannot decompress this representation",
                this.name()
            ))),
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            Self::Pca(c) => c.is_fitted(),
            Self::Quantization(c) => c.is_fitted(),
        }
    }
}
