use thiserror::Error;
use wxh_db::StoreError;
use wxh_wunderground::{
    date_range::DateRangeError, error::HistoryError, station::InvalidStationCode,
};

/// Bad command-line input. Detected before the store is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    InvalidStation(#[from] InvalidStationCode),

    #[error(transparent)]
    InvalidDateRange(#[from] DateRangeError),

    #[error("invalid date `{0}`: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("minimum sleep ({min}s) is greater than maximum sleep ({max}s)")]
    InvalidSleepBounds { min: u64, max: u64 },

    #[error("delimiter must be a single ASCII character, got `{0}`")]
    InvalidDelimiter(char),
}

/// Reasons a cache run stops before its last date.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to cache {station} on {date}")]
    DateFailed {
        station: String,
        date: String,
        #[source]
        source: HistoryError,
    },
}
