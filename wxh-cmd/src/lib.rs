//! Command implementations for the WXH CLI.
//!
//! `cache` backfills a station's daily history into the SQLite store,
//! `export` reads it back out as one row per station and date.

use clap::Subcommand;

pub mod cache;
pub mod error;
pub mod export;
pub mod pacing;
pub mod stations;

pub use cache::{cache_dates, CacheOptions, CacheSummary, FailurePolicy};
pub use error::{CacheError, ConfigError};

/// Store file used when `--store` is not given.
pub const DEFAULT_STORE: &str = "wunderground.db";

#[derive(Subcommand)]
pub enum Command {
    /// Fetch daily history for a station into the store, skipping dates
    /// that are already complete
    Cache(cache::CacheArgs),

    /// Export stored statistics, one row per station and date
    Export(export::ExportArgs),

    /// List the airport stations bundled with the tool
    Stations,
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Cache(args) => cache::run_cache(args).await,
        Command::Export(args) => export::run_export(args).await,
        Command::Stations => stations::run_stations(),
    }
}
