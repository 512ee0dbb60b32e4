//! Streaming synthesis types.
//!
//! An engine hands back its audio as a lazy iterator of chunks. Every item
//! pairs the raw samples with a small amount of bookkeeping the engine knows
//! about the chunk. Consumers that only care about audio can ignore the
//! metrics entirely.
use std::time::Duration;

/// Per-chunk metadata reported by an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMetrics {
    /// Zero-based position of the chunk within its stream.
    pub index: usize,
    /// Number of samples in the chunk.
    pub samples: usize,
    /// Time between opening the stream and producing this chunk.
    pub elapsed: Duration,
}

/// One produced chunk: mono `f32` samples in `[-1.0, 1.0]` plus its metrics.
pub type StreamedChunk = (Vec<f32>, ChunkMetrics);

/// Lazy, finite, single-pass chunk sequence borrowed from the engine.
pub type ChunkStream<'a> = Box<dyn Iterator<Item = anyhow::Result<StreamedChunk>> + 'a>;
