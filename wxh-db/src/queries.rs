//! Export queries: long-form observations pivoted into wide rows.

use std::collections::BTreeMap;

use crate::{
    error::Result,
    models::{ScanFilter, WideRow},
    Database,
};

impl Database {
    /// Column names of an export: `station`, `date`, then one column per
    /// statistic of the store's set.
    pub fn export_columns(&self) -> Vec<&'static str> {
        ["station", "date"]
            .into_iter()
            .chain(self.statistic_set.statistics().iter().map(|s| s.name()))
            .collect()
    }

    /// Pivot every matching observation into one row per `(station, date)`.
    ///
    /// Groups that lack a statistic get `None` in that column; this happens
    /// for dates written by an older parser and is not an error. Rows
    /// are sorted by station, then date. Stored statistics outside the
    /// store's set are ignored.
    pub fn export_rows(&self, filter: &ScanFilter) -> Result<Vec<WideRow>> {
        let columns = self.statistic_set.statistics();
        let mut groups: BTreeMap<(String, String), Vec<Option<i64>>> = BTreeMap::new();

        self.for_each_observation(filter, |obs| {
            let values = groups
                .entry((obs.station, obs.date))
                .or_insert_with(|| vec![None; columns.len()]);
            if let Some(index) = columns.iter().position(|s| s.name() == obs.statistic) {
                values[index].get_or_insert(obs.value);
            }
        })?;

        let rows: Vec<WideRow> = groups
            .into_iter()
            .map(|((station, date), values)| WideRow {
                station,
                date,
                values,
            })
            .collect();
        log::info!("export: {} rows", rows.len());
        Ok(rows)
    }

    /// Distinct station codes present in the store, sorted.
    pub fn stations(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT station FROM weather ORDER BY station")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(rows)
    }
}
