//! Core types and the Weather Underground daily history client.
//!
//! The remote page layout is only known to [`history`]; everything else in
//! the workspace talks to the [`history::HistorySource`] trait and the
//! [`statistic::StatisticValues`] map it returns.

#[cfg(feature = "api")]
pub mod client;
pub mod date_range;
pub mod error;
pub mod history;
pub mod station;
pub mod statistic;
