//! SQL schema definitions for the cache store.
//!
//! The schema is applied as a single batch every time a store is opened for
//! writing; every statement is idempotent.

/// `store_meta` key under which the store's statistic set is recorded.
pub const STATISTIC_SET_KEY: &str = "statistic_set";

/// Returns the full SQL schema as a single batch string.
///
/// - `weather` - one row per (station, date, statistic). The unique
///   constraint ignores conflicting inserts, so the first value written for
///   a key is the one that stays.
/// - `store_meta` - key/value settings fixed at creation time, currently
///   just the statistic set.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS weather (
        station TEXT NOT NULL,
        date TEXT NOT NULL,
        statistic TEXT NOT NULL,
        value NUMERIC NOT NULL,
        UNIQUE (station, date, statistic) ON CONFLICT IGNORE
    );
    CREATE INDEX IF NOT EXISTS idx_weather_date ON weather(date);

    CREATE TABLE IF NOT EXISTS store_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    "#
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_is_valid_sql() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema())
            .expect("Schema SQL should be valid");
    }

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema()).unwrap();

        for table in &["weather", "store_meta"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table '{}' should exist", table);
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema()).unwrap();
        conn.execute_batch(create_schema())
            .expect("Applying schema twice should succeed due to IF NOT EXISTS");
    }

    #[test]
    fn unique_constraint_ignores_duplicates() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema()).unwrap();
        let insert = "INSERT INTO weather (station, date, statistic, value) VALUES ('AUS', '2024-01-01', 'actual_max_temp', ?1)";
        assert_eq!(conn.execute(insert, [90]).unwrap(), 1);
        assert_eq!(conn.execute(insert, [91]).unwrap(), 0);
        let value: i64 = conn
            .query_row("SELECT value FROM weather", [], |row| row.get(0))
            .unwrap();
        assert_eq!(value, 90);
    }
}
