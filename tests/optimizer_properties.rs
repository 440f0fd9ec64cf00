//! End-to-end checks of the compression, pruning and caching guarantees the
//! indexing pipeline relies on.

use optimizer_core::{OptError, VectorBatch};
use std::time::Duration;
use vec_cache::{Cache, ManualClock};
use vec_compress::{Compressor, DimensionalityReducer, QuantizationCompressor};
use vec_prune::{DiversityPruner, Pruner, QualityPruner, RedundancyPruner};

fn embeddings(n: usize, d: usize) -> VectorBatch {
    let rows: Vec<Vec<f32>> = (0..n)
        .map(|i| {
            (0..d)
                .map(|j| ((i * 7 + j * 3) as f32 * 0.41).sin() * (1.0 + j as f32 * 0.1))
                .collect()
        })
        .collect();
    VectorBatch::from_rows(&rows).unwrap()
}

#[test]
fn test_pca_without_dropped_dimensions_is_lossless() {
    let batch = embeddings(40, 8);
    let mut reducer = DimensionalityReducer::new(8).unwrap();
    let compressed = reducer.compress(&batch).unwrap();
    let restored = reducer.decompress(&compressed).unwrap();

    for (a, b) in batch.as_slice().iter().zip(restored.as_slice()) {
        assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
    }
}

#[test]
fn test_later_batches_use_first_fit() {
    let mut reducer = DimensionalityReducer::new(3).unwrap();
    let fit_batch = embeddings(30, 6);
    let first = reducer.compress(&fit_batch).unwrap();

    reducer.compress(&embeddings(10, 6)).unwrap();
    // re-compressing the fitting batch gives the same coordinates
    assert_eq!(reducer.compress(&fit_batch).unwrap(), first);
}

#[test]
fn test_quantization_error_bound() {
    let batch = embeddings(25, 16);
    for bits in [2u8, 8, 16] {
        let mut quantizer = QuantizationCompressor::new(bits).unwrap();
        let compressed = quantizer.compress(&batch).unwrap();
        let restored = quantizer.decompress(&compressed).unwrap();

        let params = quantizer.params().unwrap();
        let levels = ((1u32 << bits) - 1) as f64;
        for (i, (a, b)) in batch.as_slice().iter().zip(restored.as_slice()).enumerate() {
            let j = i % 16;
            let bound = (params.max()[j] - params.min()[j]) / levels;
            assert!(((*a as f64) - (*b as f64)).abs() <= bound + 1e-6);
        }
    }
}

#[test]
fn test_decompress_requires_fit() {
    let reducer = DimensionalityReducer::new(2).unwrap();
    assert!(matches!(
        reducer.decompress(&embeddings(1, 2)),
        Err(OptError::NotFitted(_))
    ));
}

#[test]
fn test_quality_pruner_extremes() {
    let batch = embeddings(6, 4);
    let scores = [0.1, 0.9, -3.0, 4.0, 0.0, 0.5];

    let all = QualityPruner::new(f32::NEG_INFINITY)
        .unwrap()
        .prune(&batch, &scores)
        .unwrap();
    assert_eq!(all.kept_vectors, batch);

    let none = QualityPruner::new(f32::INFINITY)
        .unwrap()
        .prune(&batch, &scores)
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_top_k_extremes() {
    let batch = embeddings(5, 3);
    let scores = [0.3, 0.1, 0.5, 0.2, 0.4];
    assert_eq!(RedundancyPruner::new(5).prune(&batch, &scores).unwrap().len(), 5);
    assert!(RedundancyPruner::new(0).prune(&batch, &scores).unwrap().is_empty());
}

#[test]
fn test_diversity_keeps_better_duplicate() {
    let batch = VectorBatch::from_rows(&[vec![0.2, -0.7, 0.4], vec![0.2, -0.7, 0.4]]).unwrap();
    let out = DiversityPruner::new(0.99)
        .unwrap()
        .prune(&batch, &[0.4, 0.6])
        .unwrap();
    assert_eq!(out.kept_indices, vec![1]);
}

#[test]
fn test_diversity_rejects_infinite_components() {
    let batch = VectorBatch::from_rows(&[vec![f32::INFINITY, 0.0], vec![f32::INFINITY, 0.0]]).unwrap();
    assert!(matches!(
        DiversityPruner::new(0.5).unwrap().prune(&batch, &[1.0, 0.5]),
        Err(OptError::InvalidInput(_))
    ));
}

#[test]
fn test_every_pruner_accepts_empty_input() {
    let empty = VectorBatch::empty(4);
    let pruners: Vec<Box<dyn Pruner>> = vec![
        Box::new(QualityPruner::new(0.0).unwrap()),
        Box::new(RedundancyPruner::new(3)),
        Box::new(DiversityPruner::new(0.9).unwrap()),
    ];
    for pruner in pruners {
        let out = pruner.prune(&empty, &[]).unwrap();
        assert!(out.kept_indices.is_empty());
        assert!(out.kept_vectors.is_empty());
    }
}

#[test]
fn test_cache_evicts_unaccessed_entry() {
    let clock = ManualClock::new();
    let mut cache = Cache::with_clock(2, None, clock.clone()).unwrap();
    cache.set("a", 1);
    clock.advance(Duration::from_millis(5));
    cache.set("b", 2);
    assert_eq!(cache.get("a"), Some(1));

    cache.set("c", 3);
    assert_eq!(cache.get("b"), None);
    assert_ne!(cache.get("a"), None);
    assert_ne!(cache.get("c"), None);
}

#[test]
fn test_cache_ttl_expiry() {
    let clock = ManualClock::new();
    let mut cache = Cache::with_clock(10, Some(Duration::from_secs(1)), clock.clone()).unwrap();
    cache.set("k".to_string(), vec![1.0f32, 2.0]);
    assert!(cache.get("k").is_some());

    clock.advance(Duration::from_secs(2));
    assert_eq!(cache.get("k"), None);
    assert_eq!(cache.len(), 0);
}
