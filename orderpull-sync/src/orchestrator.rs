//! Batch orchestrator: resume check, bounded fan-out, aggregation.
//!
//! Every distinct ID ends up in exactly one bucket of [`RunStatistics`].
//! IDs whose artifact exists are counted as skipped at dispatch time and never
//! reach a worker. The rest run on a tokio task each, gated by a semaphore
//! sized to the worker count; the permit is held across the blocking fetch,
//! the write and the post-request delay, so at most `workers` requests are in
//! flight at any moment.
//!
//! Counters are owned by the collecting loop alone. Tasks hand back an
//! [`ItemResult`]; a task that panics is counted as an `other` failure and
//! never takes the run down with it.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use orderpull_core::{
    config::{DEFAULT_REQUEST_DELAY, DEFAULT_WORKERS},
    FailureKind, FetchConfig, FetchOutcome, ItemResult, OrderId, RunStatistics,
};
use orderpull_fetch::OrderTransport;

use crate::writer::{OrderSink, PersistResult};

/// Pool settings for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub workers: NonZeroUsize,
    /// Per-worker pause after each request. Total request rate therefore
    /// scales with `workers`.
    pub request_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN),
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }
}

impl From<&FetchConfig> for BatchOptions {
    fn from(config: &FetchConfig) -> Self {
        Self {
            workers: config.workers,
            request_delay: config.request_delay,
        }
    }
}

/// Drop repeated IDs, keeping the first occurrence of each.
pub fn dedup_preserving_order(ids: Vec<OrderId>) -> Vec<OrderId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Fetch and persist every order in `ids` that has no artifact yet.
///
/// Never fails: per-order problems are logged and counted.
pub async fn run_batch(
    ids: Vec<OrderId>,
    sink: Arc<OrderSink>,
    transport: Arc<dyn OrderTransport>,
    options: &BatchOptions,
) -> RunStatistics {
    let total = ids.len();
    let ids = dedup_preserving_order(ids);
    let mut stats = RunStatistics::new(total, total - ids.len());
    if stats.duplicates > 0 {
        tracing::info!(duplicates = stats.duplicates, "ignoring repeated order ids");
    }

    let count = ids.len();
    tracing::info!(
        orders = count,
        workers = options.workers.get(),
        delay_ms = options.request_delay.as_millis() as u64,
        "starting batch"
    );

    let semaphore = Arc::new(Semaphore::new(options.workers.get()));
    let mut tasks = JoinSet::new();

    for (idx, id) in ids.into_iter().enumerate() {
        let progress = Progress {
            index: idx + 1,
            count,
        };

        match sink.is_fetched(&id) {
            Ok(true) => {
                tracing::info!("{progress} order {id} already fetched, skipping");
                stats.record(&ItemResult::Skipped);
                continue;
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(order_id = %id, kind = %FailureKind::WriteFailed, error = %err, "cannot use artifact path");
                stats.record(&ItemResult::Failed(FailureKind::WriteFailed));
                continue;
            }
        }

        let semaphore = semaphore.clone();
        let sink = sink.clone();
        let transport = transport.clone();
        let delay = options.request_delay;
        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return ItemResult::Failed(FailureKind::Other);
            };
            tracing::info!("{progress} fetching order {id}");
            let result = fetch_and_persist(id, sink, transport).await;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => stats.record(&result),
            Err(err) => {
                tracing::error!(error = %err, "order task aborted");
                stats.record(&ItemResult::Failed(FailureKind::Other));
            }
        }
    }

    stats.finish();
    tracing::info!(
        succeeded = stats.succeeded,
        skipped = stats.skipped,
        failed = stats.failed(),
        "batch finished"
    );
    stats
}

async fn fetch_and_persist(
    id: OrderId,
    sink: Arc<OrderSink>,
    transport: Arc<dyn OrderTransport>,
) -> ItemResult {
    let worker_id = id.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let outcome = transport.fetch(&worker_id);
        let persisted = match &outcome {
            FetchOutcome::Success { body } => Some(sink.persist(&worker_id, body)),
            _ => None,
        };
        (outcome, persisted)
    })
    .await;

    let (outcome, persisted) = match joined {
        Ok(pair) => pair,
        Err(err) => {
            tracing::error!(order_id = %id, error = %err, "fetch worker panicked");
            return ItemResult::Failed(FailureKind::Other);
        }
    };

    match (outcome, persisted) {
        (FetchOutcome::Success { .. }, Some(Ok(PersistResult::Written { path }))) => {
            tracing::info!("saved order {id} to {}", path.display());
            ItemResult::Succeeded
        }
        (FetchOutcome::Success { .. }, Some(Ok(PersistResult::Skipped { path }))) => {
            tracing::info!("order {id} appeared at {} meanwhile, keeping it", path.display());
            ItemResult::Skipped
        }
        (FetchOutcome::Success { .. }, Some(Err(err))) => {
            tracing::warn!(order_id = %id, kind = %FailureKind::WriteFailed, error = %err, "failed to save order");
            ItemResult::Failed(FailureKind::WriteFailed)
        }
        (outcome, _) => {
            log_failure(&id, &outcome);
            outcome
                .failure_kind()
                .map_or(ItemResult::Failed(FailureKind::Other), ItemResult::Failed)
        }
    }
}

fn log_failure(id: &OrderId, outcome: &FetchOutcome) {
    let Some(kind) = outcome.failure_kind() else {
        return;
    };
    match outcome {
        FetchOutcome::NotFound => {
            tracing::warn!(order_id = %id, %kind, "order not found");
        }
        FetchOutcome::AuthError { status } => {
            tracing::warn!(order_id = %id, %kind, status, "authentication failed");
        }
        FetchOutcome::Transient { reason } => {
            tracing::warn!(order_id = %id, %kind, reason = %reason, "transient failure");
        }
        FetchOutcome::Other { status, snippet } => {
            tracing::warn!(order_id = %id, %kind, status = ?status, response = %snippet, "unexpected response");
        }
        FetchOutcome::Success { .. } => {}
    }
}

#[derive(Debug, Clone, Copy)]
struct Progress {
    index: usize,
    count: usize,
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}]", self.index, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let ids = ["3", "1", "3", "2", "1"]
            .into_iter()
            .map(OrderId::from)
            .collect();
        let got: Vec<String> = dedup_preserving_order(ids)
            .into_iter()
            .map(|id| id.0)
            .collect();
        assert_eq!(got, vec!["3", "1", "2"]);
    }

    #[test]
    fn options_follow_config() {
        let config = FetchConfig {
            workers: NonZeroUsize::new(9).unwrap(),
            request_delay: Duration::from_millis(250),
            ..FetchConfig::default()
        };
        let options = BatchOptions::from(&config);
        assert_eq!(options.workers.get(), 9);
        assert_eq!(options.request_delay, Duration::from_millis(250));
    }

    #[test]
    fn progress_formatting() {
        let p = Progress { index: 3, count: 10 };
        assert_eq!(p.to_string(), "[3/10]");
    }
}
