use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::task::JoinSet;
use tracing::{debug, error, info};
use tts_core::StreamingEngine;

use crate::error::BenchError;
use crate::report;
use crate::runner::{run_request, RequestId, RequestResult, RequestTemplate};
use crate::shared::SharedEngine;

/// Dispatch `concurrency` requests for `round` and collect them as they finish.
///
/// Every request runs on tokio's blocking pool and contends for the same
/// engine lock, so synthesis itself is serialized; only request bookkeeping
/// overlaps. Results come back in completion order.
///
/// On the first failure the remaining requests are told to abort (those still
/// queued on the lock return without touching the engine), every task is
/// still joined, and that first failure is returned. A panicked worker takes
/// precedence over any other failure. No partial round is reported.
pub async fn dispatch_round<E>(
    engine: &SharedEngine<E>,
    round: usize,
    concurrency: usize,
    template: &Arc<RequestTemplate>,
) -> Result<Vec<RequestResult>, BenchError>
where
    E: StreamingEngine + 'static,
{
    let abort = Arc::new(AtomicBool::new(false));
    let mut tasks = JoinSet::new();

    for index in 1..=concurrency {
        let request_id = RequestId::new(round, index);
        let engine = engine.clone();
        let template = Arc::clone(template);
        let abort = Arc::clone(&abort);
        tasks.spawn_blocking(move || run_request(&engine, request_id, &template, &abort));
    }

    let mut results = Vec::with_capacity(concurrency);
    let mut failure: Option<BenchError> = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(result)) => {
                info!("{}", report::request_line(&result));
                results.push(result);
            }
            Ok(Err(BenchError::Aborted(request_id))) => {
                debug!("{request_id} skipped after an earlier failure");
            }
            Ok(Err(e)) => {
                if failure.is_none() {
                    error!("Round {round} failed: {e}");
                    abort.store(true, Ordering::Release);
                    failure = Some(e);
                } else {
                    error!("Additional failure in round {round}: {e}");
                }
            }
            Err(join_err) => {
                error!("Task join error in round {round}: {join_err}");
                abort.store(true, Ordering::Release);
                // A panic poisons the engine lock; the lock errors of the
                // requests queued behind it are its consequence, not the cause.
                if !matches!(failure, Some(BenchError::Internal(_))) {
                    failure = Some(BenchError::Internal(format!(
                        "Task join error: {join_err}"
                    )));
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(results),
    }
}
