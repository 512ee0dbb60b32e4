//! Common utilities for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tts_bench::BenchConfig;
use tts_core::{ChunkMetrics, ChunkStream, StreamingEngine};

pub const SAMPLE_RATE: u32 = 16_000;

/// What a `ScriptedEngine` observed, readable without the engine lock.
#[derive(Debug, Default)]
pub struct Probe {
    pub calls: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub texts: Mutex<Vec<String>>,
}

impl Probe {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

/// Decrements the active-stream counter when the stream is dropped.
struct ActiveStream(Arc<Probe>);

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Engine producing `chunks` chunks of `chunk_samples` samples, sleeping
/// `chunk_delay` before each one. Fails the n-th `stream` call (1-based,
/// warmup included) when `fail_on_call` is set, and panics after the first
/// chunk of the n-th call when `panic_on_call` is set.
pub struct ScriptedEngine {
    pub chunks: usize,
    pub chunk_samples: usize,
    pub chunk_delay: Duration,
    pub fail_on_call: Option<usize>,
    pub panic_on_call: Option<usize>,
    pub probe: Arc<Probe>,
}

impl ScriptedEngine {
    pub fn new(chunks: usize, chunk_delay: Duration) -> Self {
        Self {
            chunks,
            chunk_samples: 1_600,
            chunk_delay,
            fail_on_call: None,
            panic_on_call: None,
            probe: Arc::new(Probe::default()),
        }
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn panicking_on(mut self, call: usize) -> Self {
        self.panic_on_call = Some(call);
        self
    }

    /// Chunks carry no samples at all.
    pub fn silent(mut self) -> Self {
        self.chunk_samples = 0;
        self
    }

    pub fn probe(&self) -> Arc<Probe> {
        Arc::clone(&self.probe)
    }
}

impl StreamingEngine for ScriptedEngine {
    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn supports_voice_cloning(&self) -> bool {
        true
    }

    fn stream<'a>(
        &'a mut self,
        text: &str,
        _reference_voice: Option<&Path>,
    ) -> anyhow::Result<ChunkStream<'a>> {
        let call = self.probe.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.texts.lock().unwrap().push(text.to_string());
        if self.fail_on_call == Some(call) {
            anyhow::bail!("scripted failure on call {call}");
        }

        let active = self.probe.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_active.fetch_max(active, Ordering::SeqCst);
        let guard = ActiveStream(Arc::clone(&self.probe));

        let panics = self.panic_on_call == Some(call);
        let delay = self.chunk_delay;
        let chunk_samples = self.chunk_samples;
        let opened = Instant::now();
        Ok(Box::new((0..self.chunks).map(move |index| {
            let _active = &guard;
            thread::sleep(delay);
            if panics && index == 1 {
                panic!("scripted panic on call {call}");
            }
            let samples = vec![0.25f32; chunk_samples];
            let metrics = ChunkMetrics {
                index,
                samples: samples.len(),
                elapsed: opened.elapsed(),
            };
            Ok((samples, metrics))
        })))
    }
}

/// Fresh, empty output directory under the system temp dir.
pub fn temp_output_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("tts_bench_tests")
        .join(format!("{name}_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn test_config(concurrency: usize, rounds: usize, output_dir: PathBuf) -> BenchConfig {
    BenchConfig {
        concurrency,
        rounds,
        text: Some("hello".to_string()),
        output_dir,
        ..BenchConfig::default()
    }
}

pub fn wav_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with(".wav"))
        .collect();
    names.sort();
    names
}
