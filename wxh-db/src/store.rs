//! Write path and raw reads of the cache store.
//!
//! Writes are insert-or-ignore: the first value stored for a
//! `(station, date, statistic)` is permanent. All statistics of one date are
//! written through a [`DateBatch`], which commits them as a single
//! transaction so a date is either fully visible or not at all.

use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, Transaction};
use std::collections::HashSet;
use wxh_utils::dates::format_date;
use wxh_wunderground::statistic::{Statistic, StatisticValues};

use crate::{
    error::Result,
    models::{Observation, ScanFilter},
    Database,
};

impl Database {
    /// Whether every statistic of the store's set is present for
    /// `(station, date)`.
    ///
    /// Checks each expected statistic by name, so rows for statistics
    /// outside the set never make a date look complete.
    pub fn has_complete(&self, station: &str, date: &NaiveDate) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT statistic FROM weather WHERE station = ?1 AND date = ?2")?;
        let present = stmt
            .query_map(params![station, format_date(date)], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<HashSet<String>, _>>()?;
        Ok(self
            .statistic_set
            .statistics()
            .iter()
            .all(|stat| present.contains(stat.name())))
    }

    /// Store one value outside of any batch.
    ///
    /// Returns `false` when the key already existed; the stored value is
    /// left untouched in that case.
    pub fn put(
        &self,
        station: &str,
        date: &NaiveDate,
        statistic: Statistic,
        value: i64,
    ) -> Result<bool> {
        insert(&self.conn, station, &format_date(date), statistic, value)
    }

    /// Start the write scope for one date.
    ///
    /// Nothing written through the batch is visible to other connections
    /// until [`DateBatch::commit`]; dropping the batch rolls back.
    pub fn begin_date(&mut self, station: &str, date: &NaiveDate) -> Result<DateBatch<'_>> {
        let tx = self.conn.transaction()?;
        Ok(DateBatch {
            tx,
            station: station.to_string(),
            date: format_date(date),
            inserted: 0,
        })
    }

    /// Stream every observation matching `filter` to `f`, in no particular
    /// order.
    pub fn for_each_observation<F>(&self, filter: &ScanFilter, mut f: F) -> Result<()>
    where
        F: FnMut(Observation),
    {
        let (sql, values) = scan_query(filter);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            f(Observation {
                station: row.get(0)?,
                date: row.get(1)?,
                statistic: row.get(2)?,
                value: row.get(3)?,
            });
        }
        Ok(())
    }

    /// Collect every observation matching `filter`.
    pub fn scan(&self, filter: &ScanFilter) -> Result<Vec<Observation>> {
        let mut observations = Vec::new();
        self.for_each_observation(filter, |obs| observations.push(obs))?;
        Ok(observations)
    }

    /// Total number of stored observations.
    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM weather", [], |row| row.get(0))?)
    }
}

/// Uncommitted writes for one `(station, date)`.
pub struct DateBatch<'conn> {
    tx: Transaction<'conn>,
    station: String,
    date: String,
    inserted: usize,
}

impl DateBatch<'_> {
    /// Insert-or-ignore one statistic; returns whether a row was added.
    pub fn put(&mut self, statistic: Statistic, value: i64) -> Result<bool> {
        let inserted = insert(&self.tx, &self.station, &self.date, statistic, value)?;
        if inserted {
            self.inserted += 1;
        }
        Ok(inserted)
    }

    /// Insert-or-ignore every value in `values`; returns the number of new
    /// rows.
    pub fn put_all(&mut self, values: &StatisticValues) -> Result<usize> {
        let before = self.inserted;
        for (statistic, value) in values {
            self.put(*statistic, *value)?;
        }
        Ok(self.inserted - before)
    }

    /// Make every write of this batch durable at once. Returns the number of
    /// rows added.
    pub fn commit(self) -> Result<usize> {
        let inserted = self.inserted;
        self.tx.commit()?;
        Ok(inserted)
    }

    /// Discard every write of this batch.
    pub fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

fn insert(
    conn: &Connection,
    station: &str,
    date: &str,
    statistic: Statistic,
    value: i64,
) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO weather (station, date, statistic, value)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    let changed = stmt.execute(params![station, date, statistic.name(), value])?;
    Ok(changed == 1)
}

fn scan_query(filter: &ScanFilter) -> (String, Vec<String>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if !filter.stations.is_empty() {
        let placeholders = vec!["?"; filter.stations.len()].join(", ");
        clauses.push(format!("station IN ({})", placeholders));
        values.extend(filter.stations.iter().cloned());
    }
    if let Some(from) = &filter.from {
        clauses.push("date >= ?".to_string());
        values.push(format_date(from));
    }
    if let Some(to) = &filter.to {
        clauses.push("date <= ?".to_string());
        values.push(format_date(to));
    }

    let mut sql = String::from("SELECT station, date, statistic, value FROM weather");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    (sql, values)
}

#[cfg(test)]
mod tests {
    use crate::{Database, ScanFilter};
    use chrono::NaiveDate;
    use wxh_wunderground::statistic::{Statistic, StatisticSet, StatisticValues};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn full_day(base: i64) -> StatisticValues {
        StatisticSet::Temperature
            .statistics()
            .iter()
            .enumerate()
            .map(|(i, stat)| (*stat, base + i as i64))
            .collect()
    }

    #[test]
    fn put_twice_keeps_one_row() {
        let db = Database::open_in_memory(StatisticSet::Temperature).unwrap();
        let date = ymd(2024, 1, 1);
        assert!(db.put("AUS", &date, Statistic::ActualMaxTemp, 90).unwrap());
        assert!(!db.put("AUS", &date, Statistic::ActualMaxTemp, 90).unwrap());
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn put_with_new_value_keeps_first() {
        let db = Database::open_in_memory(StatisticSet::Temperature).unwrap();
        let date = ymd(2024, 1, 1);
        db.put("AUS", &date, Statistic::ActualMaxTemp, 90).unwrap();
        assert!(!db.put("AUS", &date, Statistic::ActualMaxTemp, 95).unwrap());

        let observations = db.scan(&ScanFilter::all()).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].value, 90);
    }

    #[test]
    fn completeness_requires_every_statistic() {
        let db = Database::open_in_memory(StatisticSet::Temperature).unwrap();
        let date = ymd(2024, 1, 1);
        assert!(!db.has_complete("AUS", &date).unwrap());

        let stats = StatisticSet::Temperature.statistics();
        for stat in &stats[..5] {
            db.put("AUS", &date, *stat, 1).unwrap();
        }
        assert!(!db.has_complete("AUS", &date).unwrap(), "5 of 6 is incomplete");

        db.put("AUS", &date, stats[5], 1).unwrap();
        assert!(db.has_complete("AUS", &date).unwrap());
        assert!(!db.has_complete("BOS", &date).unwrap());
        assert!(!db.has_complete("AUS", &ymd(2024, 1, 2)).unwrap());
    }

    #[test]
    fn foreign_statistics_do_not_count_towards_completeness() {
        let db = Database::open_in_memory(StatisticSet::TemperatureAndPrecipitation).unwrap();
        let date = ymd(2024, 1, 1);
        for stat in StatisticSet::Temperature.statistics() {
            db.put("AUS", &date, *stat, 1).unwrap();
        }
        assert!(!db.has_complete("AUS", &date).unwrap());
        db.put("AUS", &date, Statistic::ActualPrecipitation, 0).unwrap();
        assert!(db.has_complete("AUS", &date).unwrap());
    }

    #[test]
    fn batch_commit_and_rollback() {
        let mut db = Database::open_in_memory(StatisticSet::Temperature).unwrap();
        let date = ymd(2024, 1, 1);

        let mut batch = db.begin_date("AUS", &date).unwrap();
        assert_eq!(batch.put_all(&full_day(50)).unwrap(), 6);
        batch.rollback().unwrap();
        assert_eq!(db.count().unwrap(), 0);

        let mut batch = db.begin_date("AUS", &date).unwrap();
        batch.put_all(&full_day(50)).unwrap();
        drop(batch);
        assert_eq!(db.count().unwrap(), 0, "dropping a batch rolls back");

        let mut batch = db.begin_date("AUS", &date).unwrap();
        batch.put_all(&full_day(50)).unwrap();
        assert_eq!(batch.commit().unwrap(), 6);
        assert!(db.has_complete("AUS", &date).unwrap());

        // Re-writing a complete date adds nothing and changes nothing
        let mut batch = db.begin_date("AUS", &date).unwrap();
        assert_eq!(batch.put_all(&full_day(70)).unwrap(), 0);
        assert_eq!(batch.commit().unwrap(), 0);
        let values: Vec<i64> = db
            .scan(&ScanFilter::all())
            .unwrap()
            .iter()
            .map(|o| o.value)
            .collect();
        assert!(values.iter().all(|v| (50..56).contains(v)));
    }

    #[test]
    fn scan_filters() {
        let mut db = Database::open_in_memory(StatisticSet::Temperature).unwrap();
        for (station, date) in [
            ("AUS", ymd(2024, 1, 1)),
            ("AUS", ymd(2024, 1, 2)),
            ("BOS", ymd(2024, 1, 1)),
            ("SEA", ymd(2024, 1, 3)),
        ] {
            let mut batch = db.begin_date(station, &date).unwrap();
            batch.put(Statistic::ActualMaxTemp, 10).unwrap();
            batch.commit().unwrap();
        }

        assert_eq!(db.scan(&ScanFilter::all()).unwrap().len(), 4);

        let aus = db.scan(&ScanFilter::station("AUS")).unwrap();
        assert_eq!(aus.len(), 2);
        assert!(aus.iter().all(|o| o.station == "AUS"));

        let filter = ScanFilter {
            stations: vec!["AUS".into(), "SEA".into()],
            from: Some(ymd(2024, 1, 2)),
            to: None,
        };
        let mut dates: Vec<String> = db
            .scan(&filter)
            .unwrap()
            .into_iter()
            .map(|o| o.date)
            .collect();
        dates.sort();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03"]);

        let window = ScanFilter {
            stations: Vec::new(),
            from: Some(ymd(2024, 1, 1)),
            to: Some(ymd(2024, 1, 1)),
        };
        assert_eq!(db.scan(&window).unwrap().len(), 2);
    }
}
