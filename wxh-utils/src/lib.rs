//! Shared utility functions for WXH crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDate;

    /// Canonical date key format used in the store and the export: "YYYY-MM-DD"
    pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DATE_KEY_FORMAT).to_string()
    }

    /// Format a NaiveDate as "YYYY/MM/DD" for use in URL paths
    pub fn format_date_path(date: &NaiveDate) -> String {
        date.format("%Y/%m/%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), DATE_KEY_FORMAT)?)
    }

    /// Number of days in the given month, or `None` if the month is not 1-12.
    ///
    /// Uses the proleptic Gregorian calendar, so February has 29 days in
    /// leap years.
    pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        u32::try_from((next_first - first).num_days()).ok()
    }

}
