//! Daily history page parsing and the fetch seam used by the cache.
//!
//! # Page contract
//!
//! The statistics live in the table with id `historyTable`. Each row is
//! reduced to the text of its `span` elements in document order (nested
//! spans included), the first of which is the row label:
//!
//! ```text
//! <tr><td><span>Max Temperature</span></td>
//!     <td><span class="wx-data"><span class="wx-value">91</span><span class="wx-unit">°F</span></span></td>
//!     ... average cell ... record cell ...</tr>
//!
//! texts  : "Max Temperature", "91°F", "91", "°F", "89°F", "89", "°F", "102°F", "102", "°F"
//! tokens :        ""         , "91" , "91",  "" , "89" , "89",  "" , "102" , "102",  ""
//! index  :        0          ,  1   ,  2  ,  3  ,  4   ,  5  ,  6  ,   7   ,   8  ,  9
//! ```
//!
//! Tokens 2, 5 and 8 are the actual, average and record values. Precipitation
//! only uses token 2; stripping the decimal point turns inches into
//! hundredths of an inch. This indexing is tied to one snapshot of the
//! remote layout and is the first thing to check when parsing starts to fail.

use chrono::NaiveDate;
use log::debug;
use scraper::{ElementRef, Html, Selector};

use crate::{
    error::{HistoryError, ParseError},
    statistic::{Statistic, StatisticSet, StatisticValues},
};

/// Element id of the statistics table.
pub const HISTORY_TABLE_ID: &str = "historyTable";

const ACTUAL_TOKEN: usize = 2;
const AVERAGE_TOKEN: usize = 5;
const RECORD_TOKEN: usize = 8;

/// Something that can produce the statistics of one (station, date).
///
/// Implementations perform a single attempt; retrying and pacing are up to
/// the caller.
#[allow(async_fn_in_trait)]
pub trait HistorySource {
    async fn fetch(&self, station: &str, date: NaiveDate)
        -> Result<StatisticValues, HistoryError>;
}

/// Extract every statistic the page carries.
///
/// Returns whatever subset could be read; a page with none of them is an
/// error rather than an empty success.
pub fn parse_daily_history(html: &str) -> Result<StatisticValues, ParseError> {
    let table_selector = selector(&format!("table#{HISTORY_TABLE_ID}"))?;
    let row_selector = selector("tr")?;
    let span_selector = selector("span")?;

    let document = Html::parse_document(html);
    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| ParseError::TableNotFound(HISTORY_TABLE_ID.to_string()))?;

    let mut statistics = StatisticValues::new();
    for row in table.select(&row_selector) {
        let texts = span_texts(row, &span_selector);
        let Some(label) = texts.first() else {
            continue;
        };
        let tokens: Vec<String> = texts.iter().map(|t| numeric_token(t)).collect();

        let fields: &[(usize, Statistic)] = if label.contains("Max Temperature") {
            &[
                (ACTUAL_TOKEN, Statistic::ActualMaxTemp),
                (AVERAGE_TOKEN, Statistic::AverageMaxTemp),
                (RECORD_TOKEN, Statistic::RecordMaxTemp),
            ]
        } else if label.contains("Min Temperature") {
            &[
                (ACTUAL_TOKEN, Statistic::ActualMinTemp),
                (AVERAGE_TOKEN, Statistic::AverageMinTemp),
                (RECORD_TOKEN, Statistic::RecordMinTemp),
            ]
        } else if label.contains("Precipitation") {
            &[(ACTUAL_TOKEN, Statistic::ActualPrecipitation)]
        } else {
            continue;
        };

        for (index, statistic) in fields {
            match tokens.get(*index).and_then(|t| t.parse::<i64>().ok()) {
                Some(value) => {
                    statistics.insert(*statistic, value);
                }
                None => debug!("row `{}` has no value for {}", label, statistic),
            }
        }
    }

    if statistics.is_empty() {
        return Err(ParseError::NoStatistics);
    }
    Ok(statistics)
}

/// Check that `values` covers every member of `set`, keeping only those
/// members.
pub fn require_complete(
    values: &StatisticValues,
    set: StatisticSet,
) -> Result<StatisticValues, HistoryError> {
    let missing = set.missing_from(values);
    if missing.is_empty() {
        Ok(set.restrict(values))
    } else {
        Err(HistoryError::PartialData { missing })
    }
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::Selector(css.to_string()))
}

fn span_texts(row: ElementRef<'_>, span_selector: &Selector) -> Vec<String> {
    row.select(span_selector)
        .map(|span| span.text().collect::<String>())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Drop every character that is not a digit or a minus sign.
fn numeric_token(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY_HISTORY: &str = include_str!("../../fixtures/daily_history.html");

    #[test]
    fn test_parse_fixture_page() {
        let stats = parse_daily_history(DAILY_HISTORY).unwrap();
        assert_eq!(stats.get(&Statistic::ActualMaxTemp), Some(&91));
        assert_eq!(stats.get(&Statistic::AverageMaxTemp), Some(&89));
        assert_eq!(stats.get(&Statistic::RecordMaxTemp), Some(&102));
        assert_eq!(stats.get(&Statistic::ActualMinTemp), Some(&71));
        assert_eq!(stats.get(&Statistic::AverageMinTemp), Some(&68));
        assert_eq!(stats.get(&Statistic::RecordMinTemp), Some(&-3));
        assert_eq!(stats.get(&Statistic::ActualPrecipitation), Some(&27));
        assert_eq!(stats.len(), 7);
    }

    #[test]
    fn test_numeric_token() {
        assert_eq!(numeric_token("91°F"), "91");
        assert_eq!(numeric_token("-3 °F"), "-3");
        assert_eq!(numeric_token("0.27 in"), "027");
        assert_eq!(numeric_token("°F"), "");
        assert_eq!(numeric_token("T"), "");
    }

    #[test]
    fn test_missing_table() {
        let html = "<html><body><table id=\"other\"><tr><td><span>Max Temperature</span></td></tr></table></body></html>";
        assert_eq!(
            parse_daily_history(html),
            Err(ParseError::TableNotFound(HISTORY_TABLE_ID.to_string()))
        );
    }

    #[test]
    fn test_table_without_statistics() {
        let html = "<table id=\"historyTable\"><tr><td><span>Mean Temperature</span></td></tr></table>";
        assert_eq!(parse_daily_history(html), Err(ParseError::NoStatistics));
    }

    #[test]
    fn test_truncated_row_yields_subset() {
        // Record cell missing from the max row, min row absent entirely
        let html = r#"<table id="historyTable">
<tr><td><span>Max Temperature</span></td>
<td><span class="wx-data"><span class="wx-value">90</span><span class="wx-unit">F</span></span></td>
<td><span class="wx-data"><span class="wx-value">85</span><span class="wx-unit">F</span></span></td>
</tr></table>"#;
        let stats = parse_daily_history(html).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.get(&Statistic::ActualMaxTemp), Some(&90));
        assert_eq!(stats.get(&Statistic::AverageMaxTemp), Some(&85));
        assert!(!stats.contains_key(&Statistic::RecordMaxTemp));
    }

    #[test]
    fn test_trace_precipitation_is_skipped() {
        let html = r#"<table id="historyTable">
<tr><td><span>Precipitation</span></td>
<td><span class="wx-data"><span class="wx-value">T</span></span></td></tr>
<tr><td><span>Min Temperature</span></td>
<td><span class="wx-data"><span class="wx-value">60</span><span>F</span></span></td>
<td><span class="wx-data"><span class="wx-value">55</span><span>F</span></span></td>
<td><span class="wx-data"><span class="wx-value">40</span><span>F</span></span></td></tr>
</table>"#;
        let stats = parse_daily_history(html).unwrap();
        assert!(!stats.contains_key(&Statistic::ActualPrecipitation));
        assert_eq!(stats.get(&Statistic::RecordMinTemp), Some(&40));
    }

    #[test]
    fn test_require_complete() {
        let stats = parse_daily_history(DAILY_HISTORY).unwrap();
        let temps = require_complete(&stats, StatisticSet::Temperature).unwrap();
        assert_eq!(temps.len(), 6);
        assert!(!temps.contains_key(&Statistic::ActualPrecipitation));

        let mut partial = stats.clone();
        partial.remove(&Statistic::RecordMinTemp);
        match require_complete(&partial, StatisticSet::Temperature) {
            Err(HistoryError::PartialData { missing }) => {
                assert_eq!(missing, vec![Statistic::RecordMinTemp])
            }
            other => panic!("expected partial data error, got {other:?}"),
        }
    }
}
