//! Read-side model structs.

use chrono::NaiveDate;

/// One stored value, in the long form the store keeps.
///
/// `statistic` is kept as the raw stored name so rows written under an
/// older statistic list can still be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub station: String,
    /// Date key, "YYYY-MM-DD"
    pub date: String,
    pub statistic: String,
    pub value: i64,
}

/// Which observations a scan or export should see. The default matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    /// Station codes to include; empty means every station.
    pub stations: Vec<String>,
    /// Inclusive lower bound on the date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the date.
    pub to: Option<NaiveDate>,
}

impl ScanFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn station(code: &str) -> Self {
        Self {
            stations: vec![code.to_string()],
            ..Self::default()
        }
    }
}

/// One exported row: a `(station, date)` with one value per statistic of
/// the store's set, in set order. `None` where the store has no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideRow {
    pub station: String,
    pub date: String,
    pub values: Vec<Option<i64>>,
}

impl WideRow {
    /// Whether every column has a value.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }
}
