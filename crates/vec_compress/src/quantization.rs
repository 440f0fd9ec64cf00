use crate::state::CompressorState;
use crate::Compressor;
use optimizer_core::{OptError, OptResult, VectorBatch};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Guards the scale against zero-width ranges (constant dimensions).
const RANGE_EPSILON: f64 = 1e-8;

/// Integer codes at the narrowest width that holds `bits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuantizedCodes {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl QuantizedCodes {
    pub fn len(&self) -> usize {
        match self {
            Self::U8(codes) => codes.len(),
            Self::U16(codes) => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Option<u16> {
        match self {
            Self::U8(codes) => codes.get(i).map(|&c| c as u16),
            Self::U16(codes) => codes.get(i).copied(),
        }
    }
}

/// A batch of quantized vectors, row-major like [`VectorBatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedBatch {
    pub bits: u8,
    pub n_dimensions: usize,
    pub codes: QuantizedCodes,
}

impl QuantizedBatch {
    pub fn n_vectors(&self) -> usize {
        if self.n_dimensions == 0 {
            0
        } else {
            self.codes.len() / self.n_dimensions
        }
    }
}

/// Per-dimension `min` and `scale = (2^bits - 1) / (max - min + ε)`.
#[derive(Debug, Clone)]
pub struct QuantizationParams {
    min: Vec<f64>,
    max: Vec<f64>,
    scale: Vec<f64>,
}

impl QuantizationParams {
    fn fit(batch: &VectorBatch, bits: u8) -> OptResult<Self> {
        if batch.is_empty() || batch.n_dimensions() == 0 {
            return Err(OptError::invalid_input(
                "cannot fit quantization on an empty batch",
            ));
        }
        if !batch.all_finite() {
            return Err(OptError::invalid_input(
                "cannot fit quantization on NaN or infinite values",
            ));
        }

        let d = batch.n_dimensions();
        let mut min = vec![f64::INFINITY; d];
        let mut max = vec![f64::NEG_INFINITY; d];
        for row in batch.rows() {
            for (j, &v) in row.iter().enumerate() {
                let v = v as f64;
                min[j] = min[j].min(v);
                max[j] = max[j].max(v);
            }
        }

        let levels = max_code(bits) as f64;
        let scale = min
            .iter()
            .zip(&max)
            .map(|(lo, hi)| levels / (hi - lo + RANGE_EPSILON))
            .collect();

        debug!(
            "Fitted {}-bit quantization on {} vectors of {} dimensions",
            bits,
            batch.n_vectors(),
            d
        );

        Ok(Self { min, max, scale })
    }

    pub fn n_dimensions(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

/// Linear scalar quantization, e.g. f32 -> 8-bit codes for a 4x reduction.
#[derive(Debug, Clone)]
pub struct QuantizationCompressor {
    bits: u8,
    state: CompressorState<QuantizationParams>,
}

impl QuantizationCompressor {
    /// `bits` must be in `1..=16`.
    pub fn new(bits: u8) -> OptResult<Self> {
        if !(1..=16).contains(&bits) {
            return Err(OptError::invalid_input(format!(
                "bits must be in 1..=16, got {}",
                bits
            )));
        }
        Ok(Self {
            bits,
            state: CompressorState::Unfitted,
        })
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn params(&self) -> Option<&QuantizationParams> {
        self.state.params()
    }

    pub fn compression_ratio(&self) -> Option<f64> {
        let stored_bits = if self.bits <= 8 { 8.0 } else { 16.0 };
        self.params().map(|_| 32.0 / stored_bits)
    }
}

impl Compressor for QuantizationCompressor {
    type Compressed = QuantizedBatch;

    fn compress(&mut self, batch: &VectorBatch) -> OptResult<QuantizedBatch> {
        let bits = self.bits;
        let params = self.state.fit_once(|| QuantizationParams::fit(batch, bits))?;

        let d = params.n_dimensions();
        if batch.n_dimensions() != d {
            return Err(OptError::invalid_input(format!(
                "batch has {} dimensions, quantizer was fitted on {}",
                batch.n_dimensions(),
                d
            )));
        }
        if !batch.all_finite() {
            return Err(OptError::invalid_input(
                "cannot quantize NaN or infinite values",
            ));
        }

        let levels = max_code(bits) as f64;
        let raw = batch.as_slice().iter().enumerate().map(|(i, &v)| {
            let j = i % d;
            ((v as f64 - params.min[j]) * params.scale[j])
                .round()
                .clamp(0.0, levels) as u16
        });
        let codes = if bits <= 8 {
            QuantizedCodes::U8(raw.map(|c| c as u8).collect())
        } else {
            QuantizedCodes::U16(raw.collect())
        };

        Ok(QuantizedBatch {
            bits,
            n_dimensions: d,
            codes,
        })
    }

    fn decompress(&self, compressed: &QuantizedBatch) -> OptResult<VectorBatch> {
        let params = self.state.fitted("QuantizationCompressor")?;
        let d = params.n_dimensions();
        if compressed.n_dimensions != d || compressed.bits != self.bits {
            return Err(OptError::invalid_input(format!(
                "quantized batch ({} bits, {} dimensions) does not match quantizer ({} bits, {} dimensions)",
                compressed.bits, compressed.n_dimensions, self.bits, d
            )));
        }
        if compressed.codes.len() % d != 0 {
            return Err(OptError::invalid_input(
                "quantized code buffer is not a whole number of vectors",
            ));
        }

        let data = (0..compressed.codes.len())
            .filter_map(|i| compressed.codes.get(i).map(|c| (i, c)))
            .map(|(i, code)| {
                let j = i % d;
                (code as f64 / params.scale[j] + params.min[j]) as f32
            })
            .collect();
        VectorBatch::new(d, data)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }
}

fn max_code(bits: u8) -> u32 {
    (1u32 << bits) - 1
}
