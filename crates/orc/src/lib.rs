/*!
# Orchestration Layer

This crate wires the optimization components into the flow the indexing and
query pipeline follows:

1. Check the embedding / query / result cache before doing expensive work
2. On a miss, compute and store
3. Before indexing, prune the batch and compress what survives
4. At query time, restore stored vectors through the same fitted compressor
*/

pub mod pipeline;
pub mod shared;

pub use pipeline::{IndexPayload, OptimizationPipeline, StoredVectors};
pub use shared::SharedPipeline;
