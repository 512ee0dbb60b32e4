use thiserror::Error;

use crate::runner::RequestId;

/// Benchmark error types
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Engine failure in {request_id}: {source:#}")]
    EngineFailure {
        request_id: RequestId,
        source: anyhow::Error,
    },

    #[error("Warmup failed: {0:#}")]
    Warmup(anyhow::Error),

    #[error("Request {0} aborted after an earlier failure in its round")]
    Aborted(RequestId),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BenchError {
    pub fn engine(request_id: RequestId, source: impl Into<anyhow::Error>) -> Self {
        BenchError::EngineFailure {
            request_id,
            source: source.into(),
        }
    }

    /// Configuration errors are reported before any measurement starts.
    pub fn is_configuration(&self) -> bool {
        matches!(self, BenchError::Configuration(_))
    }
}
