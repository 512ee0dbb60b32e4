use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::info;
use tts_core::StreamingEngine;

use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::orchestrator;
use crate::report;
use crate::runner::{RequestResult, RequestTemplate};
use crate::shared::SharedEngine;
use crate::stats::Summary;
use crate::validation::preflight;
use crate::warmup;

/// Results of one round, sorted by request id.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub round: usize,
    pub results: Vec<RequestResult>,
    /// Elapsed time around the whole dispatch, not the sum of requests.
    pub wall_time: Duration,
}

impl RoundReport {
    pub fn new(round: usize, mut results: Vec<RequestResult>, wall_time: Duration) -> Self {
        results.sort_by_key(|r| r.request_id);
        Self { round, results, wall_time }
    }

    pub fn summary(&self) -> Option<Summary> {
        Summary::from_results(&self.results)
    }
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub rounds: Vec<RoundReport>,
    /// Reported for information; the warmup request is in no statistic.
    pub warmup_time: Duration,
}

impl SessionReport {
    /// Every measured request, round by round in id order.
    pub fn results(&self) -> impl Iterator<Item = &RequestResult> {
        self.rounds.iter().flat_map(|r| r.results.iter())
    }

    pub fn request_count(&self) -> usize {
        self.rounds.iter().map(|r| r.results.len()).sum()
    }

    pub fn summary(&self) -> Option<Summary> {
        Summary::from_results(self.results())
    }
}

/// A benchmark session: one shared engine, one warmup, `rounds` sequential
/// rounds of `concurrency` requests each.
pub struct Session<E> {
    engine: SharedEngine<E>,
    config: BenchConfig,
    template: Arc<RequestTemplate>,
}

impl<E: StreamingEngine + 'static> Session<E> {
    /// Runs the pre-flight checks; a session that exists is ready to measure.
    pub fn new(config: BenchConfig, engine: E) -> Result<Self, BenchError> {
        preflight(&config, engine.supports_voice_cloning())?;
        let template = Arc::new(RequestTemplate::from_config(&config));
        Ok(Self {
            engine: SharedEngine::new(engine),
            config,
            template,
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn engine(&self) -> &SharedEngine<E> {
        &self.engine
    }

    pub async fn run(&self) -> Result<SessionReport, BenchError> {
        let warmup_time = warmup::warm_up(
            &self.engine,
            &self.config.warmup_text,
            self.config.reference_voice.as_deref(),
        )
        .await?;

        info!(
            "Starting {} benchmark: {} concurrent request(s), {} round(s)",
            self.config.scenario(),
            self.config.concurrency,
            self.config.rounds
        );

        let mut rounds = Vec::with_capacity(self.config.rounds);
        for round in 1..=self.config.rounds {
            info!("--- Round {round} ---");
            let report = self.run_round(round).await?;
            info!("{}", report::round_line(&report));
            rounds.push(report);
        }

        Ok(SessionReport { rounds, warmup_time })
    }

    async fn run_round(&self, round: usize) -> Result<RoundReport, BenchError> {
        let started = Instant::now();
        let results = orchestrator::dispatch_round(
            &self.engine,
            round,
            self.config.concurrency,
            &self.template,
        )
        .await?;
        Ok(RoundReport::new(round, results, started.elapsed()))
    }
}
