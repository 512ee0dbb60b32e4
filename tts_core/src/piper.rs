use std::{fmt, fs, path::{Path, PathBuf}, time::Instant};

use anyhow::Context;
use piper_rs::synth::{PiperSpeechStreamParallel, PiperSpeechSynthesizer};

use crate::{ChunkMetrics, ChunkStream, Device, StreamingEngine};

/// Piper voice loaded from its `.onnx.json` config.
pub struct PiperEngine {
    synth: PiperSpeechSynthesizer,
    sample_rate: u32,
    config_path: PathBuf,
    device: Device,
}

// Manual Debug implementation since PiperSpeechSynthesizer doesn't implement Debug
impl fmt::Debug for PiperEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PiperEngine")
            .field("synth", &"<PiperSpeechSynthesizer>")
            .field("sample_rate", &self.sample_rate)
            .field("config_path", &self.config_path)
            .field("device", &self.device)
            .finish()
    }
}

impl PiperEngine {
    /// Load a voice. Piper runs through onnxruntime's default execution
    /// provider; `device` is recorded for reporting only.
    pub fn load<P: AsRef<Path>>(config_path: P, device: Device) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();
        let sample_rate = read_sample_rate(config_path)?;
        let model = piper_rs::from_config_path(config_path)
            .map_err(|e| anyhow::anyhow!("piper load error: {e}"))?;
        let synth = PiperSpeechSynthesizer::new(model)?;

        Ok(Self {
            synth,
            sample_rate,
            config_path: config_path.to_path_buf(),
            device,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn device(&self) -> Device {
        self.device
    }
}

impl StreamingEngine for PiperEngine {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn stream<'a>(
        &'a mut self,
        text: &str,
        reference_voice: Option<&Path>,
    ) -> anyhow::Result<ChunkStream<'a>> {
        if let Some(path) = reference_voice {
            anyhow::bail!(
                "piper voices cannot be cloned (reference voice {} given)",
                path.display()
            );
        }

        let opened = Instant::now();
        let iter: PiperSpeechStreamParallel = self
            .synth
            .synthesize_parallel(text.to_string(), None)
            .map_err(|e| anyhow::anyhow!("piper synth error: {e}"))?;

        Ok(Box::new(iter.enumerate().map(move |(index, part)| {
            let samples = part
                .map_err(|e| anyhow::anyhow!("chunk error: {e}"))?
                .into_vec();
            let metrics = ChunkMetrics {
                index,
                samples: samples.len(),
                elapsed: opened.elapsed(),
            };
            Ok((samples, metrics))
        })))
    }
}

/// Read `audio.sample_rate` from a Piper voice config JSON.
pub(crate) fn read_sample_rate<P: AsRef<Path>>(cfg_path: P) -> anyhow::Result<u32> {
    let text = fs::read_to_string(cfg_path.as_ref())
        .with_context(|| format!("Failed to read config file: {}", cfg_path.as_ref().display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| "Config file is not valid JSON")?;

    let sample_rate = json
        .get("audio")
        .and_then(|a| a.get("sample_rate"))
        .and_then(|sr| sr.as_u64())
        .ok_or_else(|| anyhow::anyhow!("Missing or invalid 'audio.sample_rate' in config"))?;

    u32::try_from(sample_rate).with_context(|| format!("sample rate {sample_rate} out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("tts_core_piper_tests");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_read_sample_rate() {
        let path = write_config(
            "voice_ok.onnx.json",
            r#"{"audio": {"sample_rate": 22050, "quality": "medium"}}"#,
        );
        assert_eq!(read_sample_rate(&path).unwrap(), 22050);
    }

    #[test]
    fn test_read_sample_rate_missing_field() {
        let path = write_config("voice_missing.onnx.json", r#"{"audio": {}}"#);
        let err = read_sample_rate(&path).unwrap_err();
        assert!(err.to_string().contains("audio.sample_rate"));
    }

    #[test]
    fn test_read_sample_rate_invalid_json() {
        let path = write_config("voice_broken.onnx.json", "not json");
        assert!(read_sample_rate(&path).is_err());
    }

    #[test]
    fn test_load_missing_config() {
        let err = PiperEngine::load("/nonexistent/voice.onnx.json", Device::Cpu).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
