//! The `cache` command: fetch every incomplete date of a range into the
//! store.
//!
//! Dates are handled one at a time, oldest first. Each date moves from
//! pending to fetching and ends up stored, skipped or failed:
//!
//! - skipped: the store already holds the full statistic set (unless
//!   `force`). No request and no pause.
//! - stored: the page was fetched and parsed and its statistics were
//!   committed as one transaction.
//! - failed: the fetch or parse failed. Depending on [`FailurePolicy`] the
//!   run logs it and moves on or stops.
//!
//! Store errors always stop the run. Because every date commits on its own,
//! an interrupted run resumes where it left off.

use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use log::{info, warn};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use wxh_db::{Database, StoreError};
use wxh_utils::dates::format_date;
use wxh_wunderground::{
    client::{ClientConfig, HistoryClient, DEFAULT_BASE_URL},
    date_range::valid_date_range,
    error::HistoryError,
    history::{require_complete, HistorySource},
    station::Station,
    statistic::{StatisticSet, StatisticValues},
};

use crate::{
    error::{CacheError, ConfigError},
    pacing::{pause, NoPacing, Pacer, RandomPacer},
    DEFAULT_STORE,
};

/// Upper bound accepted for `--retries`.
pub const MAX_RETRIES: i64 = 100;

#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// Airport station code, e.g. AUS
    pub station: String,

    /// Year to cache [default: current year]
    pub year: Option<i32>,

    /// Month to cache, 1-12 [default: every month]
    pub month: Option<u32>,

    /// Day of the month to cache [default: every day]
    pub day: Option<u32>,

    /// Re-fetch dates that are already complete
    #[arg(short, long)]
    pub force: bool,

    /// Do not pause between requests
    #[arg(short = 'n', long)]
    pub no_sleep: bool,

    /// Fetch and parse but never commit to the store
    #[arg(long, alias = "nop")]
    pub dry_run: bool,

    /// SQLite store to cache statistics in
    #[arg(short = 'd', long = "store", alias = "database", default_value = DEFAULT_STORE)]
    pub store: PathBuf,

    /// Stop at the first date that cannot be fetched or parsed
    #[arg(long)]
    pub fail_fast: bool,

    /// Lower bound of the pause between requests, in seconds
    #[arg(long, default_value_t = 5)]
    pub min_sleep: u64,

    /// Upper bound of the pause between requests, in seconds
    #[arg(long, default_value_t = 10)]
    pub max_sleep: u64,

    /// Extra attempts for a date whose request fails in transit
    #[arg(
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u32).range(0..=MAX_RETRIES)
    )]
    pub retries: u32,

    /// Request timeout, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Also cache actual precipitation (only when creating a new store)
    #[arg(long)]
    pub with_precipitation: bool,

    /// Base URL of the history site
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

/// What happens to a date that cannot be fetched or parsed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailurePolicy {
    /// Log the failure and move on to the next date
    #[default]
    Continue,
    /// Abort the whole run
    FailFast,
}

#[derive(Debug, Default, Clone)]
pub struct CacheOptions {
    /// Fetch even when the date is already complete
    pub force: bool,
    /// Roll back instead of committing
    pub dry_run: bool,
    pub failure_policy: FailurePolicy,
    /// Extra attempts after a retryable transport failure
    pub retries: u32,
}

/// Final state of one date.
#[derive(Debug)]
pub enum DateOutcome {
    /// Statistics were written; `committed` is false on a dry run.
    Stored { inserted: usize, committed: bool },
    Skipped,
    Failed(HistoryError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheSummary {
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Bring every date of `dates` for `station` into the store.
///
/// `dates` should be ascending; they are processed strictly in order. The
/// pacer is consulted after every stored or failed date and between retry
/// attempts, never after a skipped date.
pub async fn cache_dates<S: HistorySource>(
    db: &mut Database,
    source: &S,
    pacer: &mut dyn Pacer,
    station: &str,
    dates: &[NaiveDate],
    options: &CacheOptions,
) -> Result<CacheSummary, CacheError> {
    let mut summary = CacheSummary::default();

    for date in dates {
        let date_key = format_date(date);
        match cache_date(db, source, pacer, station, date, options).await? {
            DateOutcome::Skipped => {
                summary.skipped += 1;
                info!("{} {}: already cached, skipping", station, date_key);
                continue;
            }
            DateOutcome::Stored {
                inserted,
                committed,
            } => {
                summary.stored += 1;
                if committed {
                    info!("{} {}: stored {} statistics", station, date_key, inserted);
                } else {
                    info!(
                        "{} {}: parsed {} statistics (dry run, not committed)",
                        station, date_key, inserted
                    );
                }
            }
            DateOutcome::Failed(e) => {
                summary.failed += 1;
                warn!("{} {}: failed: {}", station, date_key, e);
                if options.failure_policy == FailurePolicy::FailFast {
                    return Err(CacheError::DateFailed {
                        station: station.to_string(),
                        date: date_key,
                        source: e,
                    });
                }
            }
        }
        pause(pacer).await;
    }

    Ok(summary)
}

async fn cache_date<S: HistorySource>(
    db: &mut Database,
    source: &S,
    pacer: &mut dyn Pacer,
    station: &str,
    date: &NaiveDate,
    options: &CacheOptions,
) -> Result<DateOutcome, CacheError> {
    if !options.force && db.has_complete(station, date)? {
        return Ok(DateOutcome::Skipped);
    }

    info!("Retrieving weather for {} on {}", station, format_date(date));
    let fetched = match fetch_with_retries(source, pacer, station, date, options.retries).await {
        Ok(values) => values,
        Err(e) => return Ok(DateOutcome::Failed(e)),
    };
    // Never write a date that would still be incomplete afterwards
    let values = match require_complete(&fetched, db.statistic_set()) {
        Ok(values) => values,
        Err(e) => return Ok(DateOutcome::Failed(e)),
    };

    let mut batch = db.begin_date(station, date)?;
    let inserted = batch.put_all(&values)?;
    let committed = if options.dry_run {
        batch.rollback()?;
        false
    } else {
        batch.commit()?;
        true
    };
    Ok(DateOutcome::Stored {
        inserted,
        committed,
    })
}

async fn fetch_with_retries<S: HistorySource>(
    source: &S,
    pacer: &mut dyn Pacer,
    station: &str,
    date: &NaiveDate,
    retries: u32,
) -> Result<StatisticValues, HistoryError> {
    let max_tries = retries.saturating_add(1);
    let mut attempt = 1;
    loop {
        match source.fetch(station, *date).await {
            Ok(values) => return Ok(values),
            Err(e) if e.is_retryable() && attempt < max_tries => {
                warn!(
                    "Attempt {}/{}: {} {}: {}",
                    attempt,
                    max_tries,
                    station,
                    format_date(date),
                    e
                );
                attempt += 1;
                pause(pacer).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Open the store for a run. A dry run against a store that does not exist
/// yet works on an in-memory store so no file is created.
fn open_store(
    path: &Path,
    requested: Option<StatisticSet>,
    dry_run: bool,
) -> Result<Database, StoreError> {
    if dry_run && !path.exists() {
        info!("{} does not exist, dry run uses a scratch store", path.display());
        return Database::open_in_memory(requested.unwrap_or_default());
    }
    Database::open(path, requested)
}

/// Entry point of `wxh cache`.
pub async fn run_cache(args: CacheArgs) -> anyhow::Result<()> {
    let station = Station::normalize_code(&args.station).map_err(ConfigError::from)?;
    let known = Station::get_station_vector()?;
    match Station::find(&known, &station) {
        Some(s) => info!("Station {} ({})", s.code, s.title),
        None => info!("Station {} is not in the bundled station table", station),
    }

    let today = Local::now().date_naive();
    let dates =
        valid_date_range(args.year, args.month, args.day, today).map_err(ConfigError::from)?;

    let mut pacer: Box<dyn Pacer> = if args.no_sleep {
        Box::new(NoPacing)
    } else {
        Box::new(RandomPacer::from_secs(args.min_sleep, args.max_sleep)?)
    };

    let requested = args
        .with_precipitation
        .then_some(StatisticSet::TemperatureAndPrecipitation);
    let mut db = open_store(&args.store, requested, args.dry_run)?;

    let client = HistoryClient::new(ClientConfig {
        base_url: args.base_url.clone(),
        timeout: Duration::from_secs(args.timeout),
        statistic_set: db.statistic_set(),
    })?;

    let options = CacheOptions {
        force: args.force,
        dry_run: args.dry_run,
        failure_policy: if args.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Continue
        },
        retries: args.retries,
    };

    info!(
        "Caching {} dates for {} into {} ({} statistics)",
        dates.len(),
        station,
        args.store.display(),
        db.statistic_set()
    );

    let summary = cache_dates(&mut db, &client, pacer.as_mut(), &station, &dates, &options).await?;

    info!(
        "Cache complete: {} stored, {} skipped, {} failed",
        summary.stored, summary.skipped, summary.failed
    );
    Ok(())
}
