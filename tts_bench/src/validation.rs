use crate::config::BenchConfig;
use crate::error::BenchError;

/// Maximum text length for benchmark requests
const MAX_TEXT_LENGTH: usize = 5000;

/// Validate the shape of a configuration without touching the filesystem.
pub fn validate_config(config: &BenchConfig) -> Result<(), BenchError> {
    if config.concurrency == 0 {
        return Err(BenchError::Configuration(
            "Concurrency must be at least 1".to_string(),
        ));
    }
    if config.rounds == 0 {
        return Err(BenchError::Configuration(
            "Rounds must be at least 1".to_string(),
        ));
    }
    validate_text("Text", config.text())?;
    validate_text("Warmup text", &config.warmup_text)?;
    Ok(())
}

fn validate_text(what: &str, text: &str) -> Result<(), BenchError> {
    if text.trim().is_empty() {
        return Err(BenchError::Configuration(format!("{what} cannot be empty")));
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(BenchError::Configuration(format!(
            "{what} too long (max {} characters)",
            MAX_TEXT_LENGTH
        )));
    }
    Ok(())
}

/// The configured reference voice, if any, must be an existing file.
pub fn validate_reference(config: &BenchConfig) -> Result<(), BenchError> {
    match &config.reference_voice {
        Some(reference) if !reference.is_file() => Err(BenchError::Configuration(format!(
            "Reference voice file not found: {}. Provide a 3-10 second speech sample via BENCH_REFERENCE",
            reference.display()
        ))),
        _ => Ok(()),
    }
}

/// Everything that must hold before the engine sees its first request:
/// a valid configuration, an existing reference voice file, and an engine
/// able to clone when a reference voice is configured.
pub fn preflight(config: &BenchConfig, supports_voice_cloning: bool) -> Result<(), BenchError> {
    validate_config(config)?;
    validate_reference(config)?;

    if let Some(reference) = &config.reference_voice {
        if !supports_voice_cloning {
            return Err(BenchError::Configuration(format!(
                "Engine '{:?}' cannot clone voices but a reference voice was given ({})",
                config.engine,
                reference.display()
            )));
        }
    }

    Ok(())
}
