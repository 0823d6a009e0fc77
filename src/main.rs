mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use skycast_collector::{CollectorSettings, DataCollector};
use skycast_core::Config;
use skycast_services::{parse_target, CityService, ForecastError, ForecastService};
use skycast_store::{SqliteStore, StoreClient};
use skycast_weather::WeatherProvider;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {}", describe_error(&e));
            eprintln!("  {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli.command);

    skycast_core::init(&config.logging.level)?;
    let (config, _) = config.into_validated()?;

    let store = SqliteStore::open(&config.database.path)
        .with_context(|| format!("opening {}", config.database.path.display()))?;
    let store = StoreClient::sqlite(store);
    let provider = WeatherProvider::new(&config.provider)?;
    let api_key = config.provider.api_key.clone().unwrap_or_default();

    let cities = CityService::new(provider.clone(), store.clone(), api_key.as_str());
    let forecasts = ForecastService::new(provider, store, api_key.as_str());

    match cli.command {
        Commands::Run { .. } => {
            if !config.collector.enabled {
                tracing::warn!("Collector disabled; pass -s or set collector.enabled");
                return Ok(());
            }
            let settings = CollectorSettings::from_config(&config.collector)?;
            run_collector(DataCollector::new(cities, forecasts, settings)).await
        }
        Commands::Cities => print_json(&cities.list_cities().await?),
        Commands::Summary { city_id } => print_json(&forecasts.short_summary(city_id).await?),
        Commands::Detail { city_id, date } => {
            let target = parse_target(&date)?;
            print_json(&forecasts.detailed_forecast(city_id, target).await?)
        }
        Commands::AddCity { name } => {
            if api_key.is_empty() {
                anyhow::bail!("no API key; set OPENWEATHER_API_KEY or provider.api_key");
            }
            let mut city = cities.fetch_city(&name).await?;
            city.id = cities.create_city(city.clone()).await?;
            print_json(&city)
        }
    }
}

/// CLI flags win over file and environment settings.
fn apply_overrides(config: &mut Config, command: &Commands) {
    if let Commands::Run {
        start,
        cities_file,
        interval,
        parallel,
    } = command
    {
        if *start {
            config.collector.enabled = true;
        }
        if let Some(path) = cities_file {
            config.collector.cities_file = Some(path.clone());
        }
        if let Some(interval) = interval {
            config.collector.interval = interval.clone();
        }
        if *parallel {
            config.collector.parallel = true;
        }
    }
}

/// Run the collector until a shutdown signal or until it fails.
async fn run_collector(mut collector: DataCollector) -> Result<()> {
    let cancel = CancellationToken::new();
    let mut task = tokio::spawn({
        let cancel = cancel.clone();
        async move { collector.run(cancel).await }
    });

    tokio::select! {
        result = &mut task => {
            result.context("collector task failed")??;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, finishing current pass...");
            cancel.cancel();
            task.await.context("collector task failed")??;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// First line shown to the operator on failure.
///
/// Read-path errors already say what went wrong; everything else gets the
/// classified message.
fn describe_error(err: &anyhow::Error) -> String {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<ForecastError>() {
            if !matches!(e, ForecastError::Store(_)) {
                return e.to_string();
            }
        }
    }
    skycast_core::user_message(err).to_string()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_run_flags_override_config() {
        let mut config = Config::default();
        let command = Commands::Run {
            start: true,
            cities_file: Some(PathBuf::from("cities.txt")),
            interval: Some("10s".to_string()),
            parallel: true,
        };

        apply_overrides(&mut config, &command);

        assert!(config.collector.enabled);
        assert!(config.collector.parallel);
        assert_eq!(config.collector.interval, "10s");
        assert_eq!(config.collector.cities_file, Some(PathBuf::from("cities.txt")));
    }

    #[test]
    fn test_bad_detail_date_is_described() {
        let err = anyhow::Error::new(parse_target("06/02/2026").unwrap_err());
        let message = describe_error(&err);
        assert!(message.contains("Invalid date '06/02/2026'"), "{message}");
        assert!(message.contains("YYYY-MM-DD"), "{message}");
    }

    #[test]
    fn test_read_path_not_found_is_described() {
        let err = anyhow::Error::new(ForecastError::NotFound("city 9".into()));
        assert_eq!(describe_error(&err), "Not found: city 9");
    }

    #[test]
    fn test_other_errors_use_classified_message() {
        let err = anyhow::Error::new(skycast_core::NetworkError::Timeout);
        assert_eq!(describe_error(&err), "The weather provider timed out.");
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let mut config = Config::default();
        config.collector.parallel = true;

        apply_overrides(
            &mut config,
            &Commands::Run {
                start: false,
                cities_file: None,
                interval: None,
                parallel: false,
            },
        );

        assert!(config.collector.parallel);
        assert!(!config.collector.enabled);
        assert_eq!(config.collector.interval, "1m");
    }
}
