use tracing::{error, info};

use tts_bench::report::{self, JsonReport};
use tts_bench::validation::{validate_config, validate_reference};
use tts_bench::{BenchConfig, EngineKind, Session};
use tts_core::{Device, PiperEngine, StreamingEngine, SyntheticConfig, SyntheticEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    let config = BenchConfig::from_env();

    // Cheap checks first, loading a voice can take seconds
    if let Err(e) = validate_config(&config).and_then(|_| validate_reference(&config)) {
        error!("{e}");
        return Err(e.into());
    }

    let device = Device::resolve(config.device);
    info!("Using device: {device}");

    match config.engine {
        EngineKind::Piper => {
            info!("Loading Piper voice from {}...", config.model_config.display());
            let engine = PiperEngine::load(&config.model_config, device)?;
            info!("Voice loaded ({} Hz)", engine.sample_rate());
            run(config, engine, device).await
        }
        EngineKind::Synthetic => {
            info!("Using synthetic engine, numbers reflect harness overhead only");
            run(config, SyntheticEngine::new(SyntheticConfig::default()), device).await
        }
    }
}

async fn run<E>(config: BenchConfig, engine: E, device: Device) -> anyhow::Result<()>
where
    E: StreamingEngine + 'static,
{
    let session = match Session::new(config, engine) {
        Ok(session) => session,
        Err(e) => {
            error!("{e}");
            return Err(e.into());
        }
    };

    let config = session.config();
    info!(
        "Benchmark: concurrency={}, rounds={}, reference={}",
        config.concurrency,
        config.rounds,
        config
            .reference_voice
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    info!("Text: {}", config.text());

    let report = session.run().await?;

    for line in report::session_lines(&report, config) {
        info!("{line}");
    }

    if let Some(path) = &config.report_json {
        report::write_json(path, &JsonReport::new(&report, config, device))?;
        info!("JSON report written to {}", path.display());
    }

    Ok(())
}
