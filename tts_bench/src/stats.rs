// Summary statistics over request results

use std::time::Duration;

use serde::Serialize;

use crate::runner::{serialize_secs, RequestResult};

/// Aggregate figures over a non-empty set of requests. Recomputed from the
/// results whenever needed, never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub requests: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub avg_first_chunk_latency: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub min_first_chunk_latency: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub max_first_chunk_latency: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub p50_first_chunk_latency: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub p95_first_chunk_latency: Duration,
    pub avg_rtf: f64,
    pub min_rtf: f64,
    pub max_rtf: f64,
    #[serde(serialize_with = "serialize_secs")]
    pub avg_total_time: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub avg_lock_wait: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub total_audio: Duration,
}

impl Summary {
    /// `None` for an empty collection.
    pub fn from_results<'a, I>(results: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a RequestResult>,
    {
        let results: Vec<&RequestResult> = results.into_iter().collect();
        if results.is_empty() {
            return None;
        }
        let n = results.len();

        let mut latencies: Vec<Duration> = results.iter().map(|r| r.first_chunk_latency).collect();
        latencies.sort_unstable();
        let rtfs: Vec<f64> = results.iter().map(|r| r.rtf).collect();

        let sum = |f: fn(&RequestResult) -> Duration| -> Duration {
            results.iter().map(|r| f(r)).sum()
        };

        Some(Self {
            requests: n,
            avg_first_chunk_latency: mean(sum(|r| r.first_chunk_latency), n),
            min_first_chunk_latency: latencies[0],
            max_first_chunk_latency: latencies[n - 1],
            p50_first_chunk_latency: percentile(&latencies, 50),
            p95_first_chunk_latency: percentile(&latencies, 95),
            avg_rtf: rtfs.iter().sum::<f64>() / n as f64,
            min_rtf: rtfs.iter().copied().fold(f64::INFINITY, f64::min),
            max_rtf: rtfs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            avg_total_time: mean(sum(|r| r.total_time), n),
            avg_lock_wait: mean(sum(|r| r.lock_wait), n),
            total_audio: sum(|r| r.audio_duration),
        })
    }
}

fn mean(total: Duration, n: usize) -> Duration {
    match u32::try_from(n) {
        Ok(n) => total / n,
        Err(_) => total.div_f64(n as f64),
    }
}

/// Nearest-rank percentile over already sorted samples.
fn percentile(sorted: &[Duration], p: u8) -> Duration {
    let index = (sorted.len() * p as usize / 100).min(sorted.len() - 1);
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RequestId;
    use std::path::PathBuf;

    fn result(index: usize, latency_ms: u64, total_ms: u64, rtf: f64) -> RequestResult {
        RequestResult {
            request_id: RequestId::new(1, index),
            first_chunk_latency: Duration::from_millis(latency_ms),
            total_time: Duration::from_millis(total_ms),
            lock_wait: Duration::from_millis(latency_ms / 2),
            audio_duration: Duration::from_secs(1),
            rtf,
            chunks: 1,
            output_file: PathBuf::from(format!("test_r1_req{index}.wav")),
        }
    }

    #[test]
    fn test_summary_empty() {
        assert!(Summary::from_results(&Vec::<RequestResult>::new()).is_none());
    }

    #[test]
    fn test_summary_values() {
        let results = vec![
            result(1, 100, 400, 0.4),
            result(2, 300, 800, 0.8),
            result(3, 200, 600, 0.6),
        ];
        let summary = Summary::from_results(&results).unwrap();

        assert_eq!(summary.requests, 3);
        assert_eq!(summary.avg_first_chunk_latency, Duration::from_millis(200));
        assert_eq!(summary.min_first_chunk_latency, Duration::from_millis(100));
        assert_eq!(summary.max_first_chunk_latency, Duration::from_millis(300));
        assert_eq!(summary.p50_first_chunk_latency, Duration::from_millis(200));
        assert_eq!(summary.p95_first_chunk_latency, Duration::from_millis(300));
        assert!((summary.avg_rtf - 0.6).abs() < 1e-9);
        assert_eq!(summary.min_rtf, 0.4);
        assert_eq!(summary.max_rtf, 0.8);
        assert_eq!(summary.avg_total_time, Duration::from_millis(600));
        assert_eq!(summary.total_audio, Duration::from_secs(3));
    }

    #[test]
    fn test_summary_is_order_independent() {
        let forward = vec![result(1, 10, 20, 1.5), result(2, 30, 60, 0.5)];
        let backward: Vec<_> = forward.iter().rev().cloned().collect();
        assert_eq!(
            Summary::from_results(&forward),
            Summary::from_results(&backward)
        );
    }

    #[test]
    fn test_mean_beyond_u32_count() {
        let n = u32::MAX as usize + 1;
        let avg = mean(Duration::from_secs(n as u64), n);
        let one = Duration::from_secs(1);
        let diff = if avg > one { avg - one } else { one - avg };
        assert!(diff < Duration::from_micros(1));
        assert_eq!(mean(Duration::from_millis(900), 3), Duration::from_millis(300));
    }

    #[test]
    fn test_percentile_single_sample() {
        let samples = [Duration::from_millis(7)];
        assert_eq!(percentile(&samples, 50), Duration::from_millis(7));
        assert_eq!(percentile(&samples, 95), Duration::from_millis(7));
    }
}
