pub mod config;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod session;
pub mod shared;
pub mod stats;
pub mod validation;
pub mod warmup;

pub use config::{BenchConfig, EngineKind, RtfMode, Scenario};
pub use error::BenchError;
pub use runner::{RequestId, RequestResult, RequestTemplate};
pub use session::{RoundReport, Session, SessionReport};
pub use shared::SharedEngine;
pub use stats::Summary;
