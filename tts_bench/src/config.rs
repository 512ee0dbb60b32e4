// Configuration for a benchmark session

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use serde::Serialize;
use tracing::warn;
use tts_core::Device;

pub const DEFAULT_SYNTHESIS_TEXT: &str =
    "Hello world, this is a simple test for text to speech performance.";
pub const DEFAULT_CLONE_TEXT: &str = "Hello world, this is a voice cloning performance test.";
pub const DEFAULT_CONCURRENT_CLONE_TEXT: &str =
    "Hello world, this is a concurrent voice cloning performance test.";
pub const DEFAULT_WARMUP_TEXT: &str = "Warm up";

/// How the real-time factor is computed from a request's timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RtfMode {
    /// `total_time / audio_duration`; below 1.0 is faster than real time.
    #[default]
    SynthesisOverAudio,
    /// `audio_duration / total_time`; above 1.0 is faster than real time.
    AudioOverSynthesis,
}

impl RtfMode {
    pub fn compute(self, total_time: Duration, audio_duration: Duration) -> f64 {
        let total = total_time.as_secs_f64();
        let audio = audio_duration.as_secs_f64();
        match self {
            RtfMode::SynthesisOverAudio => total / audio,
            RtfMode::AudioOverSynthesis => audio / total,
        }
    }
}

impl FromStr for RtfMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "synthesis_over_audio" | "total/audio" => Ok(RtfMode::SynthesisOverAudio),
            "audio_over_synthesis" | "audio/total" => Ok(RtfMode::AudioOverSynthesis),
            other => Err(format!("unknown RTF mode '{other}'")),
        }
    }
}

/// Which engine adapter the binary loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    #[default]
    Piper,
    Synthetic,
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "piper" => Ok(EngineKind::Piper),
            "synthetic" | "sine" => Ok(EngineKind::Synthetic),
            other => Err(format!("unknown engine '{other}'")),
        }
    }
}

/// Benchmark flavour, derived from whether a reference voice is cloned and
/// whether requests overlap. Only affects output file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Synthesis,
    VoiceClone,
    ConcurrentClone,
}

impl Scenario {
    pub fn file_prefix(self) -> &'static str {
        match self {
            Scenario::Synthesis => "test",
            Scenario::VoiceClone => "clone_test",
            Scenario::ConcurrentClone => "concurrent_clone_req",
        }
    }

    pub fn default_text(self) -> &'static str {
        match self {
            Scenario::Synthesis => DEFAULT_SYNTHESIS_TEXT,
            Scenario::VoiceClone => DEFAULT_CLONE_TEXT,
            Scenario::ConcurrentClone => DEFAULT_CONCURRENT_CLONE_TEXT,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::Synthesis => "synthesis",
            Scenario::VoiceClone => "voice clone",
            Scenario::ConcurrentClone => "concurrent voice clone",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchConfig {
    /// Requests dispatched per round.
    pub concurrency: usize,
    pub rounds: usize,
    /// Text to synthesize; `None` uses the scenario's default text.
    pub text: Option<String>,
    pub reference_voice: Option<PathBuf>,
    pub warmup_text: String,
    pub engine: EngineKind,
    /// Piper voice config (`.onnx.json`).
    pub model_config: PathBuf,
    /// Preferred device; `None` picks the best available one.
    pub device: Option<Device>,
    pub output_dir: PathBuf,
    pub output_prefix: Option<String>,
    pub rtf_mode: RtfMode,
    pub report_json: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            rounds: 1,
            text: None,
            reference_voice: None,
            warmup_text: DEFAULT_WARMUP_TEXT.to_string(),
            engine: EngineKind::Piper,
            model_config: PathBuf::from("models/en_US/en_US-lessac-medium.onnx.json"),
            device: None,
            output_dir: PathBuf::from("bench_output"),
            output_prefix: None,
            rtf_mode: RtfMode::SynthesisOverAudio,
            report_json: None,
        }
    }
}

/// Non-empty environment variable, trimmed.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parsed environment variable. A value that is set but does not parse is
/// logged and ignored.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {key}={raw:?}: not a valid value, using the default");
            None
        }
    }
}

/// `auto` (or unset) leaves the choice to `Device::resolve`.
fn env_device(key: &str) -> Option<Device> {
    match env_string(key) {
        Some(raw) if raw.eq_ignore_ascii_case("auto") => None,
        Some(_) => env_parse(key),
        None => None,
    }
}

impl BenchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let concurrency = env_parse("BENCH_CONCURRENCY").unwrap_or(defaults.concurrency);
        let rounds = env_parse("BENCH_ROUNDS").unwrap_or(defaults.rounds);
        let text = env_string("BENCH_TEXT");
        let reference_voice = env_string("BENCH_REFERENCE").map(PathBuf::from);
        let warmup_text = env_string("BENCH_WARMUP_TEXT").unwrap_or(defaults.warmup_text);
        let engine = env_parse("BENCH_ENGINE").unwrap_or(defaults.engine);
        let model_config = env_string("BENCH_MODEL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_config);

        let device = env_device("BENCH_DEVICE");

        let output_dir = env_string("BENCH_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);
        let output_prefix = env_string("BENCH_OUTPUT_PREFIX");
        let rtf_mode = env_parse("BENCH_RTF_MODE").unwrap_or(defaults.rtf_mode);
        let report_json = env_string("BENCH_REPORT_JSON").map(PathBuf::from);

        Self {
            concurrency,
            rounds,
            text,
            reference_voice,
            warmup_text,
            engine,
            model_config,
            device,
            output_dir,
            output_prefix,
            rtf_mode,
            report_json,
        }
    }

    pub fn scenario(&self) -> Scenario {
        match (&self.reference_voice, self.concurrency) {
            (None, _) => Scenario::Synthesis,
            (Some(_), 0 | 1) => Scenario::VoiceClone,
            (Some(_), _) => Scenario::ConcurrentClone,
        }
    }

    pub fn text(&self) -> &str {
        self.text
            .as_deref()
            .unwrap_or_else(|| self.scenario().default_text())
    }

    /// Prefix for persisted audio files.
    pub fn file_prefix(&self) -> &str {
        self.output_prefix
            .as_deref()
            .unwrap_or_else(|| self.scenario().file_prefix())
    }

    pub fn total_requests(&self) -> usize {
        self.concurrency * self.rounds
    }
}
