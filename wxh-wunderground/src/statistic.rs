use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::error::UnknownStatistic;

/// Statistics extracted from one daily history page, keyed by statistic.
pub type StatisticValues = BTreeMap<Statistic, i64>;

/// A named daily statistic.
///
/// Temperatures are whole degrees Fahrenheit; precipitation is hundredths
/// of an inch. Declaration order is the export column order.
#[derive(
    Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    ActualMaxTemp,
    AverageMaxTemp,
    RecordMaxTemp,
    ActualMinTemp,
    AverageMinTemp,
    RecordMinTemp,
    ActualPrecipitation,
}

const TEMPERATURE: [Statistic; 6] = [
    Statistic::ActualMaxTemp,
    Statistic::AverageMaxTemp,
    Statistic::RecordMaxTemp,
    Statistic::ActualMinTemp,
    Statistic::AverageMinTemp,
    Statistic::RecordMinTemp,
];

const TEMPERATURE_AND_PRECIPITATION: [Statistic; 7] = [
    Statistic::ActualMaxTemp,
    Statistic::AverageMaxTemp,
    Statistic::RecordMaxTemp,
    Statistic::ActualMinTemp,
    Statistic::AverageMinTemp,
    Statistic::RecordMinTemp,
    Statistic::ActualPrecipitation,
];

impl Statistic {
    /// Every statistic the parser knows about.
    pub const ALL: [Statistic; 7] = TEMPERATURE_AND_PRECIPITATION;

    /// Column / store name, e.g. `actual_max_temp`.
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::ActualMaxTemp => "actual_max_temp",
            Statistic::AverageMaxTemp => "average_max_temp",
            Statistic::RecordMaxTemp => "record_max_temp",
            Statistic::ActualMinTemp => "actual_min_temp",
            Statistic::AverageMinTemp => "average_min_temp",
            Statistic::RecordMinTemp => "record_min_temp",
            Statistic::ActualPrecipitation => "actual_precipitation",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = UnknownStatistic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Statistic::ALL
            .iter()
            .find(|stat| stat.name() == s)
            .copied()
            .ok_or_else(|| UnknownStatistic(s.to_string()))
    }
}

/// The canonical set of statistics a store holds for every (station, date).
///
/// A store is bound to exactly one set when it is created; completeness and
/// export columns are both derived from it.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum StatisticSet {
    /// The six record/average/actual min and max temperatures.
    #[default]
    Temperature,
    /// The temperatures plus actual precipitation.
    TemperatureAndPrecipitation,
}

impl StatisticSet {
    pub fn statistics(&self) -> &'static [Statistic] {
        match self {
            StatisticSet::Temperature => &TEMPERATURE,
            StatisticSet::TemperatureAndPrecipitation => &TEMPERATURE_AND_PRECIPITATION,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StatisticSet::Temperature => "temperature",
            StatisticSet::TemperatureAndPrecipitation => "temperature+precipitation",
        }
    }

    pub fn contains(&self, statistic: Statistic) -> bool {
        self.statistics().contains(&statistic)
    }

    /// Members of this set absent from `values`, in set order.
    pub fn missing_from(&self, values: &StatisticValues) -> Vec<Statistic> {
        self.statistics()
            .iter()
            .filter(|stat| !values.contains_key(stat))
            .copied()
            .collect()
    }

    /// Keep only the members of this set, dropping anything else the page
    /// happened to carry.
    pub fn restrict(&self, values: &StatisticValues) -> StatisticValues {
        values
            .iter()
            .filter(|(stat, _)| self.contains(**stat))
            .map(|(stat, value)| (*stat, *value))
            .collect()
    }
}

impl fmt::Display for StatisticSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatisticSet {
    type Err = UnknownStatistic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(StatisticSet::Temperature),
            "temperature+precipitation" => Ok(StatisticSet::TemperatureAndPrecipitation),
            other => Err(UnknownStatistic(other.to_string())),
        }
    }
}
