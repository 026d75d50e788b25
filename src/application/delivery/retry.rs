//! Retry policy for channel deliveries.

use std::future::Future;
use std::time::Duration;

use crate::ports::ChannelError;

/// Exponential backoff with an optional fallback channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per channel, first attempt included. Zero behaves as one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
    /// Channel tried after the primary gives up on a transient error.
    pub fallback_channel: Option<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(5),
            fallback_channel: None,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries once and never falls back.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            fallback_channel: None,
            ..Self::default()
        }
    }

    pub fn with_fallback(mut self, channel: impl Into<String>) -> Self {
        self.fallback_channel = Some(channel.into());
        self
    }

    /// Delay before retry number `retry` (1-based), capped at `max_backoff`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let millis = self.initial_backoff.as_millis() as f64 * factor;
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Runs `op` until it succeeds, fails permanently or runs out of
    /// attempts. Returns the outcome and the number of attempts made.
    pub async fn run<F, Fut, T>(&self, mut op: F) -> (Result<T, ChannelError>, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChannelError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return (Ok(value), attempt),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }
}
