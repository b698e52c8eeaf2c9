//! HTTP client for Weather Underground daily history pages.

use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use std::time::Duration;
use wxh_utils::dates::format_date_path;

use crate::{
    error::HistoryError,
    history::{parse_daily_history, require_complete, HistorySource},
    statistic::{StatisticSet, StatisticValues},
};

pub const DEFAULT_BASE_URL: &str = "http://www.wunderground.com";

/// The remote source gives no timeout guarantee, so every request gets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host, without a trailing slash
    pub base_url: String,
    pub timeout: Duration,
    /// Statistics a page must yield to count as a successful fetch
    pub statistic_set: StatisticSet,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            statistic_set: StatisticSet::default(),
        }
    }
}

/// Fetches one DailyHistory page per call and parses it.
pub struct HistoryClient {
    client: Client,
    config: ClientConfig,
}

impl HistoryClient {
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("wxh/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `{base}/history/airport/{station}/{YYYY}/{MM}/{DD}/DailyHistory.html`
    pub fn history_url(&self, station: &str, date: &NaiveDate) -> String {
        format!(
            "{}/history/airport/{}/{}/DailyHistory.html",
            self.config.base_url.trim_end_matches('/'),
            station,
            format_date_path(date)
        )
    }
}

impl HistorySource for HistoryClient {
    async fn fetch(
        &self,
        station: &str,
        date: NaiveDate,
    ) -> Result<StatisticValues, HistoryError> {
        let url = self.history_url(station, &date);
        debug!("GET {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                return Err(HistoryError::Fetch {
                    url,
                    source: Box::new(e),
                })
            }
        };

        if !response.status().is_success() {
            return Err(HistoryError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return Err(HistoryError::Fetch {
                    url,
                    source: Box::new(e),
                })
            }
        };

        let statistics = parse_daily_history(&body)?;
        require_complete(&statistics, self.config.statistic_set)
    }
}
