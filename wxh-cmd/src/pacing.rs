//! Pause policy between requests to the remote source.
//!
//! The pause exists to be polite to the server and plays no part in
//! correctness, so it sits behind a trait and tests swap in [`NoPacing`].

use log::debug;
use rand::Rng;
use std::time::Duration;

use crate::error::ConfigError;

pub trait Pacer {
    /// Delay before the next request, or `None` to continue immediately.
    fn next_delay(&mut self) -> Option<Duration>;
}

/// Never pauses. Used for `--no-sleep` and offline runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn next_delay(&mut self) -> Option<Duration> {
        None
    }
}

/// Pauses for a uniformly random duration within `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct RandomPacer {
    min: Duration,
    max: Duration,
}

impl RandomPacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Bounds in whole seconds, as given on the command line.
    pub fn from_secs(min: u64, max: u64) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidSleepBounds { min, max });
        }
        Ok(Self::new(Duration::from_secs(min), Duration::from_secs(max)))
    }
}

impl Pacer for RandomPacer {
    fn next_delay(&mut self) -> Option<Duration> {
        let min = u64::try_from(self.min.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max.as_millis()).unwrap_or(u64::MAX);
        if max == 0 {
            return None;
        }
        let millis = rand::thread_rng().gen_range(min..=max.max(min));
        Some(Duration::from_millis(millis))
    }
}

/// Ask `pacer` for a delay and sleep for it.
pub async fn pause(pacer: &mut dyn Pacer) {
    if let Some(delay) = pacer.next_delay() {
        debug!("Sleeping for {} milliseconds", delay.as_millis());
        tokio::time::sleep(delay).await;
    }
}
