//! Deterministic stand-in engine.
//!
//! Produces a sine tone whose length follows the word count of the input and
//! sleeps between chunks to mimic inference cost. Useful for dry runs of the
//! benchmark pipeline on machines without a voice model, and for tests.
use std::{f32::consts::PI, fs, path::Path, thread, time::{Duration, Instant}};

use anyhow::Context;

use crate::{ChunkMetrics, ChunkStream, StreamingEngine};

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub sample_rate: u32,
    /// Samples per produced chunk.
    pub chunk_samples: usize,
    /// Input words covered by one chunk.
    pub words_per_chunk: usize,
    /// Delay before the first chunk is produced.
    pub first_chunk_delay: Duration,
    /// Delay before every following chunk.
    pub chunk_delay: Duration,
    /// Tone pitch without a reference voice.
    pub frequency_hz: f32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            chunk_samples: 4_800,
            words_per_chunk: 2,
            first_chunk_delay: Duration::from_millis(40),
            chunk_delay: Duration::from_millis(20),
            frequency_hz: 220.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticEngine {
    config: SyntheticConfig,
    streams_opened: usize,
}

impl SyntheticEngine {
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config, streams_opened: 0 }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Number of `stream` calls that returned a sequence.
    pub fn streams_opened(&self) -> usize {
        self.streams_opened
    }

    /// Number of chunks `text` is rendered into.
    pub fn chunk_count(&self, text: &str) -> usize {
        let words = text.split_whitespace().count();
        words.div_ceil(self.config.words_per_chunk.max(1)).max(1)
    }
}

/// Map reference voice bytes onto a pitch between 110 Hz and 440 Hz.
fn pitch_from_reference(path: &Path) -> anyhow::Result<f32> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read reference voice {}", path.display()))?;
    let checksum = bytes
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_mul(31).wrapping_add(b as u32));
    Ok(110.0 + (checksum % 331) as f32)
}

impl StreamingEngine for SyntheticEngine {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn supports_voice_cloning(&self) -> bool {
        true
    }

    fn stream<'a>(
        &'a mut self,
        text: &str,
        reference_voice: Option<&Path>,
    ) -> anyhow::Result<ChunkStream<'a>> {
        let frequency = match reference_voice {
            Some(path) => pitch_from_reference(path)?,
            None => self.config.frequency_hz,
        };
        self.streams_opened += 1;

        let chunks = self.chunk_count(text);
        let config = &self.config;
        let step = 2.0 * PI * frequency / config.sample_rate as f32;
        let opened = Instant::now();

        Ok(Box::new((0..chunks).map(move |index| {
            let delay = if index == 0 { config.first_chunk_delay } else { config.chunk_delay };
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            let offset = index * config.chunk_samples;
            let samples: Vec<f32> = (offset..offset + config.chunk_samples)
                .map(|n| 0.5 * (step * n as f32).sin())
                .collect();
            let metrics = ChunkMetrics {
                index,
                samples: samples.len(),
                elapsed: opened.elapsed(),
            };
            Ok((samples, metrics))
        })))
    }
}
