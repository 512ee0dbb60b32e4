//! Human-readable report lines and the optional JSON report.

use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tts_core::Device;
use uuid::Uuid;

use crate::config::BenchConfig;
use crate::runner::{serialize_secs, RequestResult};
use crate::session::{RoundReport, SessionReport};
use crate::stats::Summary;

pub fn request_line(result: &RequestResult) -> String {
    format!(
        "Request {}: first chunk latency={:.3}s, RTF={:.3}, total time={:.3}s, lock wait={:.3}s",
        result.request_id,
        result.first_chunk_latency.as_secs_f64(),
        result.rtf,
        result.total_time.as_secs_f64(),
        result.lock_wait.as_secs_f64(),
    )
}

pub fn round_line(round: &RoundReport) -> String {
    match round.summary() {
        Some(s) => format!(
            "Round {}: avg first chunk latency={:.3}s, avg RTF={:.3}, max latency={:.3}s, min latency={:.3}s, round time={:.3}s",
            round.round,
            s.avg_first_chunk_latency.as_secs_f64(),
            s.avg_rtf,
            s.max_first_chunk_latency.as_secs_f64(),
            s.min_first_chunk_latency.as_secs_f64(),
            round.wall_time.as_secs_f64(),
        ),
        None => format!("Round {}: no requests", round.round),
    }
}

pub fn session_lines(report: &SessionReport, config: &BenchConfig) -> Vec<String> {
    let mut lines = vec![
        "Overall statistics:".to_string(),
        format!("Total requests: {}", report.request_count()),
        format!("Concurrency: {}", config.concurrency),
        format!("Rounds: {}", config.rounds),
    ];
    if let Some(s) = report.summary() {
        lines.extend([
            format!(
                "Average first chunk latency: {:.3}s",
                s.avg_first_chunk_latency.as_secs_f64()
            ),
            format!(
                "p50 / p95 first chunk latency: {:.3}s / {:.3}s",
                s.p50_first_chunk_latency.as_secs_f64(),
                s.p95_first_chunk_latency.as_secs_f64()
            ),
            format!(
                "Max first chunk latency: {:.3}s",
                s.max_first_chunk_latency.as_secs_f64()
            ),
            format!(
                "Min first chunk latency: {:.3}s",
                s.min_first_chunk_latency.as_secs_f64()
            ),
            format!("Average RTF: {:.3} ({:?})", s.avg_rtf, config.rtf_mode),
            format!("Average lock wait: {:.3}s", s.avg_lock_wait.as_secs_f64()),
        ]);
    }
    lines
}

#[derive(Serialize)]
pub struct HostInfo {
    pub cpu_count: usize,
    pub memory_total_mb: u64,
    pub memory_used_mb: u64,
}

impl HostInfo {
    pub fn snapshot() -> Self {
        let mut system = sysinfo::System::new();
        system.refresh_cpu();
        system.refresh_memory();
        Self {
            cpu_count: system.cpus().len(),
            memory_total_mb: system.total_memory() / 1024 / 1024,
            memory_used_mb: system.used_memory() / 1024 / 1024,
        }
    }
}

#[derive(Serialize)]
pub struct RoundRecord<'a> {
    pub round: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub wall_time: Duration,
    pub summary: Option<Summary>,
    pub results: &'a [RequestResult],
}

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub session_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub device: Device,
    pub host: HostInfo,
    pub config: &'a BenchConfig,
    /// Text actually synthesized, after scenario defaults.
    pub text: &'a str,
    #[serde(serialize_with = "serialize_secs")]
    pub warmup_time: Duration,
    pub rounds: Vec<RoundRecord<'a>>,
    pub summary: Option<Summary>,
}

impl<'a> JsonReport<'a> {
    pub fn new(report: &'a SessionReport, config: &'a BenchConfig, device: Device) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            device,
            host: HostInfo::snapshot(),
            config,
            text: config.text(),
            warmup_time: report.warmup_time,
            rounds: report
                .rounds
                .iter()
                .map(|r| RoundRecord {
                    round: r.round,
                    wall_time: r.wall_time,
                    summary: r.summary(),
                    results: &r.results,
                })
                .collect(),
            summary: report.summary(),
        }
    }
}

pub fn write_json<P: AsRef<Path>>(path: P, report: &JsonReport<'_>) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RequestId;
    use std::path::PathBuf;

    fn result(index: usize) -> RequestResult {
        RequestResult {
            request_id: RequestId::new(1, index),
            first_chunk_latency: Duration::from_millis(120),
            total_time: Duration::from_millis(900),
            lock_wait: Duration::from_millis(20),
            audio_duration: Duration::from_millis(1500),
            rtf: 0.6,
            chunks: 3,
            output_file: PathBuf::from(format!("test_r1_req{index}.wav")),
        }
    }

    fn session() -> SessionReport {
        SessionReport {
            rounds: vec![RoundReport::new(
                1,
                vec![result(2), result(1)],
                Duration::from_millis(1900),
            )],
            warmup_time: Duration::from_millis(300),
        }
    }

    #[test]
    fn test_request_line() {
        let line = request_line(&result(2));
        assert!(line.starts_with("Request r1_req2:"));
        assert!(line.contains("first chunk latency=0.120s"));
        assert!(line.contains("RTF=0.600"));
        assert!(line.contains("total time=0.900s"));
    }

    #[test]
    fn test_round_line() {
        let report = session();
        let line = round_line(&report.rounds[0]);
        assert!(line.starts_with("Round 1:"));
        assert!(line.contains("round time=1.900s"));
    }

    #[test]
    fn test_session_lines() {
        let lines = session_lines(&session(), &BenchConfig::default());
        assert_eq!(lines[1], "Total requests: 2");
        assert!(lines.iter().any(|l| l == "Average RTF: 0.600 (SynthesisOverAudio)"));
    }

    #[test]
    fn test_json_report_shape() {
        let report = session();
        let config = BenchConfig::default();
        let json = serde_json::to_value(JsonReport::new(&report, &config, Device::Cpu)).unwrap();

        assert_eq!(json["device"], "cpu");
        assert_eq!(json["config"]["rtf_mode"], "synthesis_over_audio");
        assert_eq!(json["text"], crate::config::DEFAULT_SYNTHESIS_TEXT);
        assert_eq!(json["rounds"][0]["results"][0]["request_id"], "r1_req1");
        assert_eq!(json["rounds"][0]["results"][1]["request_id"], "r1_req2");
        let wall_time = json["rounds"][0]["wall_time"].as_f64().unwrap();
        assert!((wall_time - 1.9).abs() < 1e-9);
        assert_eq!(json["summary"]["requests"], 2);
        assert!((json["warmup_time"].as_f64().unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_write_json() {
        let path = std::env::temp_dir()
            .join("tts_bench_report_tests")
            .join(format!("{}.json", Uuid::new_v4()));
        let report = session();
        let config = BenchConfig::default();
        write_json(&path, &JsonReport::new(&report, &config, Device::Cpu)).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["rounds"].as_array().unwrap().len(), 1);
    }
}
