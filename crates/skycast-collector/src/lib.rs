//! Scheduled weather ingestion.
//!
//! `DataCollector` seeds cities, then runs one forecast pass immediately and
//! one per interval until cancelled. Each pass goes through `run_batch`,
//! sequentially or with one task per city.

pub mod executor;
pub mod retry;
pub mod scheduler;
pub mod seed;

pub use executor::{run_batch, BatchReport, ExecutionMode, FatalError, IngestError, ItemFailure};
pub use retry::RetryConfig;
pub use scheduler::{CollectorError, CollectorSettings, DataCollector, SchedulerState};
