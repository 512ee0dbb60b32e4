//! Warm-up request
//!
//! The first request against a freshly loaded engine pays for one-time work
//! (graph optimization, allocator growth, caches). One throwaway request is
//! drained before measurement starts; nothing about it is recorded.

use std::{
    path::Path,
    time::{Duration, Instant},
};

use tracing::info;
use tts_core::StreamingEngine;

use crate::error::BenchError;
use crate::shared::SharedEngine;

/// Drain one full stream for `text`. Returns the elapsed time for logging only.
pub async fn warm_up<E>(
    engine: &SharedEngine<E>,
    text: &str,
    reference_voice: Option<&Path>,
) -> Result<Duration, BenchError>
where
    E: StreamingEngine + 'static,
{
    info!("Warming up engine...");
    let engine = engine.clone();
    let text = text.to_string();
    let reference_voice = reference_voice.map(Path::to_path_buf);
    let started = Instant::now();

    let chunks = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
        let mut guard = engine.lock()?;
        let mut chunks = 0usize;
        for item in guard.stream(&text, reference_voice.as_deref())? {
            item?;
            chunks += 1;
        }
        Ok(chunks)
    })
    .await
    .map_err(|e| BenchError::Internal(format!("Warmup task join error: {e}")))?
    .map_err(BenchError::Warmup)?;

    let elapsed = started.elapsed();
    info!(
        "Warmup finished in {:.3}s ({} chunks, excluded from statistics)",
        elapsed.as_secs_f64(),
        chunks
    );
    Ok(elapsed)
}
