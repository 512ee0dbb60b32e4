use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use anyhow::Context;
use serde::{Serialize, Serializer};
use tracing::debug;
use tts_core::StreamingEngine;

use crate::config::{BenchConfig, RtfMode};
use crate::error::BenchError;
use crate::shared::SharedEngine;

/// Identifies a request within a session. Displays as `r{round}_req{index}`
/// and orders by round, then index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId {
    pub round: usize,
    pub index: usize,
}

impl RequestId {
    pub fn new(round: usize, index: usize) -> Self {
        Self { round, index }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}_req{}", self.round, self.index)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub(crate) fn serialize_secs<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(d.as_secs_f64())
}

/// Outcome of one completed request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestResult {
    pub request_id: RequestId,
    /// Request start until the first chunk arrived, lock wait included.
    #[serde(serialize_with = "serialize_secs")]
    pub first_chunk_latency: Duration,
    /// Request start until the stream was exhausted.
    #[serde(serialize_with = "serialize_secs")]
    pub total_time: Duration,
    /// Request start until the engine lock was acquired.
    #[serde(serialize_with = "serialize_secs")]
    pub lock_wait: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub audio_duration: Duration,
    pub rtf: f64,
    pub chunks: usize,
    pub output_file: PathBuf,
}

/// Parameters shared by every request of a session.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub text: String,
    pub reference_voice: Option<PathBuf>,
    pub rtf_mode: RtfMode,
    pub output_dir: PathBuf,
    pub file_prefix: String,
}

impl RequestTemplate {
    pub fn from_config(config: &BenchConfig) -> Self {
        Self {
            text: config.text().to_string(),
            reference_voice: config.reference_voice.clone(),
            rtf_mode: config.rtf_mode,
            output_dir: config.output_dir.clone(),
            file_prefix: config.file_prefix().to_string(),
        }
    }

    /// `{output_dir}/{prefix}_{request_id}.wav`
    pub fn output_path(&self, request_id: RequestId) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.wav", self.file_prefix, request_id))
    }
}

/// Chunks collected while holding the engine lock.
struct Capture {
    chunks: Vec<Vec<f32>>,
    first_chunk_at: Option<Instant>,
    finished_at: Instant,
}

/// Drain one stream. The first-chunk timestamp is taken once, on the first
/// element, however many follow.
fn consume<E: StreamingEngine + ?Sized>(
    engine: &mut E,
    text: &str,
    reference_voice: Option<&Path>,
) -> anyhow::Result<Capture> {
    let mut chunks = Vec::new();
    let mut first_chunk_at = None;

    for item in engine.stream(text, reference_voice)? {
        let (samples, _metrics) = item?;
        if first_chunk_at.is_none() {
            first_chunk_at = Some(Instant::now());
        }
        chunks.push(samples);
    }

    Ok(Capture {
        chunks,
        first_chunk_at,
        finished_at: Instant::now(),
    })
}

/// Reject a capture that cannot be turned into a timed waveform.
fn check_capture(capture: &Capture, sample_rate: u32) -> anyhow::Result<()> {
    if sample_rate == 0 {
        anyhow::bail!("engine reports a sample rate of 0 Hz");
    }
    if capture.chunks.iter().all(Vec::is_empty) {
        anyhow::bail!("engine produced no audio ({} chunks)", capture.chunks.len());
    }
    Ok(())
}

/// Run and time a single request against the shared engine.
///
/// The timer starts before the lock is requested, so queueing behind other
/// requests counts towards both latency figures. When `abort` is already set
/// once the lock is acquired, the engine is not called at all. Any failure of
/// this request raises `abort` for the rest of the round.
pub fn run_request<E: StreamingEngine>(
    engine: &SharedEngine<E>,
    request_id: RequestId,
    template: &RequestTemplate,
    abort: &AtomicBool,
) -> Result<RequestResult, BenchError> {
    let outcome = measure(engine, request_id, template, abort);
    if let Err(e) = &outcome {
        if !matches!(e, BenchError::Aborted(_)) {
            abort.store(true, Ordering::Release);
        }
    }
    outcome
}

fn measure<E: StreamingEngine>(
    engine: &SharedEngine<E>,
    request_id: RequestId,
    template: &RequestTemplate,
    abort: &AtomicBool,
) -> Result<RequestResult, BenchError> {
    // An unusable output location fails the request before the engine is touched
    fs::create_dir_all(&template.output_dir)
        .with_context(|| format!("Failed to create {}", template.output_dir.display()))
        .map_err(|e| BenchError::engine(request_id, e))?;

    let sample_rate = engine.sample_rate();
    let start = Instant::now();

    let (lock_wait, capture) = {
        let mut guard = engine
            .lock()
            .map_err(|e| BenchError::engine(request_id, e))?;
        let lock_wait = start.elapsed();
        if abort.load(Ordering::Acquire) {
            return Err(BenchError::Aborted(request_id));
        }
        debug!("{request_id} acquired engine after {:.3}s", lock_wait.as_secs_f64());

        let captured = consume(&mut *guard, &template.text, template.reference_voice.as_deref())
            .and_then(|capture| check_capture(&capture, sample_rate).map(|_| capture));
        match captured {
            Ok(capture) => (lock_wait, capture),
            Err(e) => {
                // Raised before the guard drops so no queued request reaches the engine
                abort.store(true, Ordering::Release);
                return Err(BenchError::engine(request_id, e));
            }
        }
    };

    let total_samples: usize = capture.chunks.iter().map(Vec::len).sum();
    let mut waveform = Vec::with_capacity(total_samples);
    for chunk in &capture.chunks {
        waveform.extend_from_slice(chunk);
    }

    let total_time = capture.finished_at.duration_since(start);
    let first_chunk_latency = capture
        .first_chunk_at
        .map_or(total_time, |at| at.duration_since(start));
    let audio_duration = tts_core::wav::duration(total_samples, sample_rate);
    let rtf = template.rtf_mode.compute(total_time, audio_duration);

    let output_file = template.output_path(request_id);
    tts_core::wav::write_wav(&output_file, &waveform, sample_rate)
        .map_err(|e| BenchError::engine(request_id, e))?;

    Ok(RequestResult {
        request_id,
        first_chunk_latency,
        total_time,
        lock_wait,
        audio_duration,
        rtf,
        chunks: capture.chunks.len(),
        output_file,
    })
}
