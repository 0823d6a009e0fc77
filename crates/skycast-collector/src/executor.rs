//! Fan-out over a batch of work items.
//!
//! Every item runs to completion regardless of how its siblings fare. The
//! two modes differ on store failures: sequential mode stops the batch with
//! a `FatalError`, parallel mode records the failure like any other.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use skycast_store::StoreError;
use skycast_weather::FetchError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One item at a time, in input order.
    Sequential,
    /// One task per item, all spawned before any is awaited.
    Parallel,
}

impl ExecutionMode {
    pub fn from_flag(parallel: bool) -> Self {
        if parallel {
            Self::Parallel
        } else {
            Self::Sequential
        }
    }
}

/// Why a single item failed.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(#[source] FetchError),

    #[error("persist failed: {0}")]
    Persist(#[source] StoreError),

    /// The task running the item panicked or was aborted.
    #[error("task failed: {0}")]
    Aborted(String),
}

#[derive(Debug)]
pub struct ItemFailure {
    pub item: String,
    pub error: IngestError,
}

/// Outcome of a finished batch. Failures are in completion order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every failed item with its cause, as `item: cause` joined by `; `.
    pub fn failure_summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("{}: {}", f.item, f.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A store write failed in sequential mode.
#[derive(Debug, Error)]
#[error("persisting {item} failed: {source}")]
pub struct FatalError {
    pub item: String,
    #[source]
    pub source: StoreError,
}

/// Run `op` once for every item.
///
/// Only sequential mode can return `Err`, and only for a persist failure.
/// Parallel mode always returns the full report after every task finished.
pub async fn run_batch<T, L, F, Fut>(
    mode: ExecutionMode,
    items: Vec<T>,
    label: L,
    op: F,
) -> Result<BatchReport, FatalError>
where
    T: Send + 'static,
    L: Fn(&T) -> String,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), IngestError>> + Send + 'static,
{
    match mode {
        ExecutionMode::Sequential => run_sequential(items, label, op).await,
        ExecutionMode::Parallel => Ok(run_parallel(items, label, op).await),
    }
}

async fn run_sequential<T, L, F, Fut>(items: Vec<T>, label: L, op: F) -> Result<BatchReport, FatalError>
where
    L: Fn(&T) -> String,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<(), IngestError>>,
{
    let mut report = BatchReport {
        total: items.len(),
        ..BatchReport::default()
    };

    for item in items {
        let name = label(&item);
        match op(item).await {
            Ok(()) => report.succeeded += 1,
            Err(IngestError::Persist(source)) => {
                tracing::error!(item = %name, "Persist failed, stopping batch: {}", source);
                return Err(FatalError { item: name, source });
            }
            Err(error) => {
                tracing::debug!(item = %name, "{}", error);
                report.failures.push(ItemFailure { item: name, error });
            }
        }
    }

    Ok(report)
}

async fn run_parallel<T, L, F, Fut>(items: Vec<T>, label: L, op: F) -> BatchReport
where
    T: Send + 'static,
    L: Fn(&T) -> String,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), IngestError>> + Send + 'static,
{
    let total = items.len();
    let op = Arc::new(op);
    let failures: Arc<Mutex<Vec<ItemFailure>>> = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = items
        .into_iter()
        .map(|item| {
            let name = label(&item);
            let op = op.clone();
            let failures = failures.clone();
            let task_name = name.clone();

            let handle = tokio::spawn(async move {
                match op(item).await {
                    Ok(()) => true,
                    Err(error) => {
                        tracing::debug!(item = %task_name, "{}", error);
                        failures.lock().push(ItemFailure { item: task_name, error });
                        false
                    }
                }
            });
            (name, handle)
        })
        .collect();

    let mut succeeded = 0;
    for (name, handle) in handles {
        match handle.await {
            Ok(true) => succeeded += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(item = %name, "Task failed: {}", e);
                failures.lock().push(ItemFailure {
                    item: name,
                    error: IngestError::Aborted(e.to_string()),
                });
            }
        }
    }

    let failures = std::mem::take(&mut *failures.lock());
    BatchReport {
        total,
        succeeded,
        failures,
    }
}
