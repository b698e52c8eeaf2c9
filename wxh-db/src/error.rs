use std::path::PathBuf;
use thiserror::Error;
use wxh_wunderground::statistic::StatisticSet;

/// Failure of the durable store. Never recoverable within a run: a silently
/// failed write would make an incomplete date look cached.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("store holds `{stored}` statistics but `{requested}` was requested")]
    StatisticSetMismatch {
        stored: StatisticSet,
        requested: StatisticSet,
    },

    #[error("store records an unknown statistic set `{0}`")]
    UnknownStatisticSet(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
