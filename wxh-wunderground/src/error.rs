/// Error types for the history client and parser
use thiserror::Error;

use crate::statistic::Statistic;

/// Boxed transport failure, so the error type does not depend on a
/// particular HTTP client.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to obtain statistics for one (station, date).
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Transport failure or request timeout
    #[error("HTTP request failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: TransportError,
    },

    /// Server answered with a non-success status
    #[error("HTTP request for {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The page was retrieved but its layout did not match
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Some, but not all, of the expected statistics were found
    #[error("page is missing statistics: {}", join_names(.missing))]
    PartialData { missing: Vec<Statistic> },
}

impl HistoryError {
    /// True for failures of the network exchange itself (the taxonomy's
    /// fetch errors), as opposed to problems with the page content.
    pub fn is_transport(&self) -> bool {
        matches!(self, HistoryError::Fetch { .. } | HistoryError::Status { .. })
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            HistoryError::Fetch { .. } => true,
            HistoryError::Status { status, .. } => *status == 429 || *status >= 500,
            HistoryError::Parse(_) | HistoryError::PartialData { .. } => false,
        }
    }
}

/// The daily history page did not have the expected structure.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("history table `{0}` not found in page")]
    TableNotFound(String),

    #[error("no statistics found in history table")]
    NoStatistics,

    #[error("invalid selector `{0}`")]
    Selector(String),
}

/// A statistic or statistic-set name that is not recognised.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown statistic: {0}")]
pub struct UnknownStatistic(pub String);

fn join_names(statistics: &[Statistic]) -> String {
    statistics
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}
