//! SQLite cache store for daily airport weather statistics.
//!
//! Observations are stored in long form, one row per
//! `(station, date, statistic)`, and read back either row by row
//! ([`Database::scan`]) or pivoted into one row per `(station, date)`
//! ([`Database::export_rows`]).
//!
//! # Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use wxh_db::{Database, ScanFilter};
//! use wxh_wunderground::statistic::{Statistic, StatisticSet};
//!
//! let mut db = Database::open_in_memory(StatisticSet::Temperature).unwrap();
//! let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//!
//! let mut batch = db.begin_date("AUS", &date).unwrap();
//! batch.put(Statistic::ActualMaxTemp, 90).unwrap();
//! batch.commit().unwrap();
//!
//! assert!(!db.has_complete("AUS", &date).unwrap());
//! assert_eq!(db.export_rows(&ScanFilter::all()).unwrap().len(), 1);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.
//!
//! # Durability
//!
//! There is no in-memory layer: every completeness check reads the file and
//! every [`DateBatch`] commit is a SQLite transaction. File stores use WAL
//! journaling so an exporter may read while a backfill is writing.

pub mod error;
pub mod models;
mod queries;
pub mod schema;
mod store;

pub use error::StoreError;
pub use models::{Observation, ScanFilter, WideRow};
pub use store::DateBatch;

use log::debug;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::{path::Path, time::Duration};
use wxh_wunderground::statistic::StatisticSet;

use crate::{error::Result, schema::STATISTIC_SET_KEY};

/// How long a connection waits on a lock held by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The cache store, bound to one [`StatisticSet`] for its whole life.
pub struct Database {
    conn: Connection,
    statistic_set: StatisticSet,
}

impl Database {
    /// Open (creating if needed) a store file for reading and writing.
    ///
    /// A new store records `requested` (or the default set). An existing
    /// store keeps the set it was created with; requesting a different one
    /// is an error so statistic sets are never mixed in one file.
    pub fn open<P: AsRef<Path>>(path: P, requested: Option<StatisticSet>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(
            "opened store {} (journal_mode={})",
            path.as_ref().display(),
            mode
        );
        Self::init(conn, requested)
    }

    /// Open an existing store without write access, e.g. for exporting
    /// while a backfill is running.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let statistic_set = read_statistic_set(&conn)?.unwrap_or_default();
        Ok(Self {
            conn,
            statistic_set,
        })
    }

    /// Create a throwaway in-memory store.
    pub fn open_in_memory(statistic_set: StatisticSet) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, Some(statistic_set))
    }

    fn init(conn: Connection, requested: Option<StatisticSet>) -> Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        let statistic_set = match (read_statistic_set(&conn)?, requested) {
            (Some(stored), Some(requested)) if stored != requested => {
                return Err(StoreError::StatisticSetMismatch { stored, requested });
            }
            (Some(stored), _) => stored,
            (None, requested) => {
                let set = requested.unwrap_or_default();
                conn.execute(
                    "INSERT INTO store_meta (key, value) VALUES (?1, ?2)",
                    params![STATISTIC_SET_KEY, set.name()],
                )?;
                set
            }
        };
        Ok(Self {
            conn,
            statistic_set,
        })
    }

    /// The canonical statistic set of this store.
    pub fn statistic_set(&self) -> StatisticSet {
        self.statistic_set
    }
}

fn read_statistic_set(conn: &Connection) -> Result<Option<StatisticSet>> {
    let name: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = ?1",
            params![STATISTIC_SET_KEY],
            |row| row.get(0),
        )
        .optional()?;
    name.map(|n| {
        n.parse::<StatisticSet>()
            .map_err(|_| StoreError::UnknownStatisticSet(n))
    })
    .transpose()
}
