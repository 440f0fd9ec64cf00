use anyhow::Context;
use optimizer_core::{OptimizerConfig, VectorBatch};
use orc::SharedPipeline;
use std::env;
use tracing::{info, warn};

const DIMENSIONS: usize = 32;
const DOCUMENTS: usize = 64;

/// Stand-in for an embedding model: a deterministic vector per text.
fn embed(text: &str) -> Vec<f32> {
    let seed = text.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    (0..DIMENSIONS)
        .map(|j| ((seed % 97) as f32 * 0.13 + j as f32 * 0.71).sin())
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment-based filtering
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Optimizer demo v{}", optimizer_core::VERSION);

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => OptimizerConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path))?,
        None => {
            warn!("No config path given, using demo defaults");
            OptimizerConfig::from_json_str(
                r#"{
                    "compression": { "kind": "quantization", "bits": 8 },
                    "pruning": { "kind": "diversity", "similarity_threshold": 0.98 }
                }"#,
            )?
        }
    };

    let pipeline: SharedPipeline = SharedPipeline::new(&config)?;

    // every fourth document repeats an earlier one, so the embedding cache
    // and the diversity pruner both have something to do
    let texts: Vec<String> = (0..DOCUMENTS)
        .map(|i| {
            let topic = if i % 4 == 3 { i - 3 } else { i };
            format!("document about topic {}", topic)
        })
        .collect();

    let mut rows = Vec::with_capacity(texts.len());
    for text in &texts {
        rows.push(pipeline.embedding_for(text, |t| Ok(embed(t))).await?);
    }
    let batch = VectorBatch::from_rows(&rows)?;
    let scores: Vec<f32> = (0..DOCUMENTS).map(|i| 1.0 - i as f32 / DOCUMENTS as f32).collect();

    let payload = pipeline.prepare_for_index(&batch, &scores).await?;
    info!(
        "Indexed {} of {} documents",
        payload.kept_indices.len(),
        DOCUMENTS
    );

    let restored = pipeline.restore(&payload.vectors).await?;
    let original = batch.select(&payload.kept_indices)?;
    let max_error = original
        .as_slice()
        .iter()
        .zip(restored.as_slice())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);
    info!("Max reconstruction error: {:.5}", max_error);

    let query = "what is topic 0";
    if pipeline.cached_query(query).await.is_none() {
        let top: Vec<usize> = payload.kept_indices.iter().take(3).copied().collect();
        pipeline
            .store_query(query, serde_json::json!({ "ids": top }))
            .await;
    }
    let cached = pipeline.cached_query(query).await;
    info!("Cached query result: {:?}", cached);

    let report = pipeline.report().await;
    info!("Telemetry: {}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
