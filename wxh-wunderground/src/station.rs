use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedded CSV of the airports the dashboard knows how to label.
pub static CSV_OBJECT: &str = include_str!("../../fixtures/stations.csv");

/// An airport weather station.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "CITY")]
    pub city: String,
    /// Display title, e.g. "Austin, TX"
    #[serde(rename = "TITLE")]
    pub title: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid station code `{0}`: expected 3 or 4 letters or digits")]
pub struct InvalidStationCode(pub String);

impl Station {
    /// Get the station vector from the embedded CSV.
    pub fn get_station_vector() -> Result<Vec<Station>, csv::Error> {
        Station::parse_station_csv(CSV_OBJECT)
    }

    /// Parse a CSV string of stations.
    ///
    /// Expected CSV columns (with headers): CODE, CITY, TITLE
    pub fn parse_station_csv(csv_object: &str) -> Result<Vec<Station>, csv::Error> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        rdr.deserialize().collect()
    }

    /// Look up a known station by code (case-insensitive).
    pub fn find<'a>(stations: &'a [Station], code: &str) -> Option<&'a Station> {
        stations.iter().find(|s| s.code.eq_ignore_ascii_case(code))
    }

    /// Validate and upper-case a station code.
    ///
    /// Airport codes are 3 (IATA) or 4 (ICAO) ASCII letters or digits. The
    /// code is substituted into a URL path, so nothing else is accepted.
    pub fn normalize_code(code: &str) -> Result<String, InvalidStationCode> {
        let trimmed = code.trim();
        let valid_length = (3..=4).contains(&trimmed.len());
        if valid_length && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(trimmed.to_ascii_uppercase())
        } else {
            Err(InvalidStationCode(code.to_string()))
        }
    }
}
