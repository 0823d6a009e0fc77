//! The recurring ingestion loop.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use skycast_core::{City, CollectorConfig, ConfigError};
use skycast_services::{CityService, ForecastService};
use skycast_store::StoreError;
use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::executor::{run_batch, BatchReport, ExecutionMode, FatalError, IngestError};
use crate::retry::{with_retry, RetryConfig};
use crate::seed;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("No cities to collect weather for")]
    NoCities,

    #[error("Failed to read seed file {}: {source}", .path.display())]
    SeedFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// Immutable collector settings, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub mode: ExecutionMode,
    pub interval: Duration,
    pub cities_file: Option<PathBuf>,
    pub refresh_cities_each_tick: bool,
    pub retry: RetryConfig,
}

impl CollectorSettings {
    pub fn from_config(config: &CollectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            mode: ExecutionMode::from_flag(config.parallel),
            interval: config.interval_duration()?,
            cities_file: config.cities_file.clone(),
            refresh_cities_each_tick: config.refresh_cities_each_tick,
            retry: RetryConfig::with_retries(config.max_retries),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, first pass not yet run
    Idle,
    /// First pass done, repeating on the interval
    Running,
}

pub struct DataCollector {
    cities: CityService,
    forecasts: ForecastService,
    settings: CollectorSettings,
    state: SchedulerState,
}

impl DataCollector {
    pub fn new(cities: CityService, forecasts: ForecastService, settings: CollectorSettings) -> Self {
        Self {
            cities,
            forecasts,
            settings,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Seed, run the first pass, then repeat every interval until `cancel` fires.
    ///
    /// A pass in progress always finishes; cancellation is observed between
    /// passes. Missed ticks are skipped rather than bunched up.
    ///
    /// # Errors
    /// `NoCities` if the store is empty after seeding, `Store` if cities can't
    /// be listed at startup, `Fatal` on a persist failure in sequential mode.
    /// A failed re-list on a later tick keeps the previous cities.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), CollectorError> {
        if let Some(path) = self.settings.cities_file.clone() {
            match seed::load_city_names(&path).await {
                Ok(names) => {
                    self.seed_cities(names).await?;
                }
                Err(e) => tracing::error!("{}", e),
            }
        }

        let mut cities = self.cities.list_cities().await?;
        if cities.is_empty() {
            return Err(CollectorError::NoCities);
        }

        tracing::info!(
            "Collecting weather for {} cities every {:?} ({:?})",
            cities.len(),
            self.settings.interval,
            self.settings.mode
        );

        self.collect_pass(&cities).await?;
        self.state = SchedulerState::Running;

        let period = self.settings.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Weather collector stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if self.settings.refresh_cities_each_tick {
                        match self.cities.list_cities().await {
                            Ok(fresh) => cities = fresh,
                            Err(e) => tracing::error!(
                                "Failed to refresh cities, reusing {} from last pass: {}",
                                cities.len(),
                                e
                            ),
                        }
                    }
                    if cities.is_empty() {
                        tracing::warn!("No cities to update");
                        continue;
                    }
                    self.collect_pass(&cities).await?;
                }
            }
        }
    }

    /// Geocode and store every seeded name.
    async fn seed_cities(&self, names: Vec<String>) -> Result<BatchReport, CollectorError> {
        let service = self.cities.clone();
        let retry = self.settings.retry.clone();

        let report = run_batch(self.settings.mode, names, String::clone, move |name: String| {
            let service = service.clone();
            let retry = retry.clone();
            async move {
                let city = with_retry(&retry, || service.fetch_city(&name))
                    .await
                    .map_err(IngestError::Fetch)?;
                service.create_city(city).await.map_err(IngestError::Persist)?;
                Ok(())
            }
        })
        .await?;

        tracing::info!(
            "Seeded {} of {} cities ({} failed)",
            report.succeeded,
            report.total,
            report.failures.len()
        );
        if !report.is_clean() {
            tracing::warn!("Seeding failures: {}", report.failure_summary());
        }
        Ok(report)
    }

    /// Fetch and store forecasts for every city once.
    async fn collect_pass(&self, cities: &[City]) -> Result<BatchReport, CollectorError> {
        let service = self.forecasts.clone();
        let retry = self.settings.retry.clone();

        let report = run_batch(
            self.settings.mode,
            cities.to_vec(),
            |city: &City| format!("{}, {}", city.name, city.country),
            move |city: City| {
                let service = service.clone();
                let retry = retry.clone();
                async move {
                    let forecasts = with_retry(&retry, || service.fetch_forecasts(&city))
                        .await
                        .map_err(IngestError::Fetch)?;
                    for forecast in forecasts {
                        service.create_forecast(forecast).await.map_err(IngestError::Persist)?;
                    }
                    Ok(())
                }
            },
        )
        .await?;

        if !report.is_clean() {
            tracing::warn!(
                "{} of {} cities failed to update: {}",
                report.failures.len(),
                report.total,
                report.failure_summary()
            );
        }
        tracing::info!("Weather was updated at {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));
        Ok(report)
    }
}
