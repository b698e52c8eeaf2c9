use chrono::{Datelike, NaiveDate, TimeDelta};
use std::mem::replace;
use thiserror::Error;
use wxh_utils::dates::days_in_month;

/// A date range iterator that yields each date from the start date
/// through the end date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0.checked_add_signed(TimeDelta::days(1))?;
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("{year}-{month:02}-{day:02} is not a calendar date")]
    InvalidDay { year: i32, month: u32, day: u32 },
}

/// Resolve a partial (year, month, day) into the dates to cache, in
/// ascending order.
///
/// - `year` defaults to the year of `today`.
/// - `month` defaults to every month of the year.
/// - `day` defaults to every day of each month.
///
/// Dates after `today` are dropped, so a day is only requested once it is
/// over. A `day` given without a `month` is applied to every month where
/// it exists (the 31st skips the short months).
pub fn valid_date_range(
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>, DateRangeError> {
    let year = year.unwrap_or_else(|| today.year());
    let months: Vec<u32> = match month {
        Some(m) if (1..=12).contains(&m) => vec![m],
        Some(m) => return Err(DateRangeError::InvalidMonth(m)),
        None => (1..=12).collect(),
    };

    let mut dates = Vec::new();
    for m in months {
        let Some(month_days) = days_in_month(year, m) else {
            continue;
        };
        let (first, last) = match day {
            None => (1, month_days),
            Some(d) if d >= 1 && d <= month_days => (d, d),
            Some(d) if month.is_some() => {
                return Err(DateRangeError::InvalidDay {
                    year,
                    month: m,
                    day: d,
                })
            }
            Some(_) => continue,
        };
        let (Some(start), Some(end)) = (
            NaiveDate::from_ymd_opt(year, m, first),
            NaiveDate::from_ymd_opt(year, m, last),
        ) else {
            continue;
        };
        dates.extend(DateRange(start, end.min(today)));
    }
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wxh_utils::dates::format_date;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_iteration() {
        let start = ymd(2022, 1, 1);
        let end = ymd(2022, 1, 5);
        let dates: Vec<NaiveDate> = DateRange(start, end).collect();
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], start);
        assert_eq!(dates[4], end);
    }

    #[test]
    fn test_date_range_empty() {
        let dates: Vec<NaiveDate> = DateRange(ymd(2022, 3, 15), ymd(2022, 3, 14)).collect();
        assert!(dates.is_empty());
    }

    #[test]
    fn test_leap_february() {
        let dates = valid_date_range(Some(2024), Some(2), None, ymd(2025, 1, 1)).unwrap();
        assert_eq!(dates.len(), 29);
        assert_eq!(format_date(&dates[0]), "2024-02-01");
        assert_eq!(format_date(&dates[28]), "2024-02-29");
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_common_february() {
        let dates = valid_date_range(Some(2023), Some(2), None, ymd(2025, 1, 1)).unwrap();
        assert_eq!(dates.len(), 28);
        assert_eq!(dates.last(), Some(&ymd(2023, 2, 28)));
    }

    #[test]
    fn test_excludes_future_dates() {
        let today = ymd(2024, 6, 15);
        let dates = valid_date_range(Some(2024), Some(6), None, today).unwrap();
        assert_eq!(dates.len(), 15);
        assert_eq!(dates.first(), Some(&ymd(2024, 6, 1)));
        assert_eq!(dates.last(), Some(&today));
    }

    #[test]
    fn test_today_is_included() {
        let today = ymd(2024, 6, 15);
        let dates = valid_date_range(Some(2024), Some(6), Some(15), today).unwrap();
        assert_eq!(dates, vec![today]);
        let tomorrow = valid_date_range(Some(2024), Some(6), Some(16), today).unwrap();
        assert!(tomorrow.is_empty());
    }

    #[test]
    fn test_defaults_to_current_year_until_today() {
        let today = ymd(2024, 3, 2);
        let dates = valid_date_range(None, None, None, today).unwrap();
        // 31 January days, 29 February days, 2 March days
        assert_eq!(dates.len(), 62);
        assert_eq!(dates.first(), Some(&ymd(2024, 1, 1)));
        assert_eq!(dates.last(), Some(&today));
    }

    #[test]
    fn test_whole_past_year() {
        let dates = valid_date_range(Some(2023), None, None, ymd(2024, 6, 15)).unwrap();
        assert_eq!(dates.len(), 365);
        let leap = valid_date_range(Some(2020), None, None, ymd(2024, 6, 15)).unwrap();
        assert_eq!(leap.len(), 366);
    }

    #[test]
    fn test_future_year_is_empty() {
        let dates = valid_date_range(Some(2030), None, None, ymd(2024, 6, 15)).unwrap();
        assert!(dates.is_empty());
    }

    #[test]
    fn test_day_without_month_skips_short_months() {
        let dates = valid_date_range(Some(2023), None, Some(31), ymd(2024, 1, 1)).unwrap();
        assert_eq!(dates.len(), 7);
        assert!(dates.iter().all(|d| d.day() == 31));
    }

    #[test]
    fn test_invalid_month_and_day() {
        let today = ymd(2024, 6, 15);
        assert_eq!(
            valid_date_range(Some(2023), Some(13), None, today),
            Err(DateRangeError::InvalidMonth(13))
        );
        assert_eq!(
            valid_date_range(Some(2023), Some(2), Some(29), today),
            Err(DateRangeError::InvalidDay {
                year: 2023,
                month: 2,
                day: 29
            })
        );
        assert!(valid_date_range(Some(2023), Some(1), Some(0), today).is_err());
    }
}
