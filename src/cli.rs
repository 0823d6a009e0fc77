//! Command-line interface definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Skycast - scheduled weather ingestion and forecast queries
#[derive(Parser)]
#[command(name = "skycast")]
#[command(version)]
#[command(about = "Scheduled weather ingestion and forecast queries", long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/skycast/config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the weather collector until interrupted
    Run {
        /// Start the collector even if disabled in config
        #[arg(short = 's', long = "start")]
        start: bool,

        /// Seed file with one city name per line
        #[arg(short = 'f', long = "file")]
        cities_file: Option<PathBuf>,

        /// Interval between passes, e.g. "30s", "1m", "1h30m"
        #[arg(short = 'u', long = "interval")]
        interval: Option<String>,

        /// Update all cities concurrently
        #[arg(short = 'p', long)]
        parallel: bool,
    },

    /// List stored cities
    Cities,

    /// Upcoming dates and average temperature for a city
    Summary {
        city_id: i64,
    },

    /// Stored forecasts for a city on a date or at a timestamp
    ///
    /// DATE is "YYYY-MM-DD" or "YYYY-MM-DD HH:MM:SS" (UTC)
    Detail {
        city_id: i64,
        date: String,
    },

    /// Look up a city by name and store it
    AddCity {
        name: String,
    },
}
