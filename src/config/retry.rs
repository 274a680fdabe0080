use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Shape of the wait sequence between attempts
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffType {
    /// Every wait equals `interval`
    Constant,
    /// Wait `i` is `interval * 2^i`, capped at `max_interval`
    #[default]
    Exponential,
}

/// Retry policy applied to every store operation
///
/// Values are signed on purpose: they usually come from operator-written
/// configuration, and negative values must be rejected with a clear error
/// instead of failing deserialization.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Base wait between attempts (unit: milliseconds)
    #[serde(default = "default_interval")]
    pub interval: i64,

    /// Number of retries after the first attempt
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: i64,

    /// Backoff shape; unset means exponential
    #[serde(default, rename = "type")]
    pub policy_type: Option<BackoffType>,

    /// Upper bound for a single exponential wait (unit: milliseconds)
    #[serde(default = "default_max_interval")]
    pub max_interval: i64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            max_retry_count: default_max_retry_count(),
            policy_type: None,
            max_interval: default_max_interval(),
        }
    }
}

impl RetryPolicy {
    pub fn constant(
        interval: i64,
        max_retry_count: i64,
    ) -> Self {
        Self {
            interval,
            max_retry_count,
            policy_type: Some(BackoffType::Constant),
            ..Self::default()
        }
    }

    pub fn exponential(
        interval: i64,
        max_retry_count: i64,
    ) -> Self {
        Self {
            interval,
            max_retry_count,
            policy_type: Some(BackoffType::Exponential),
            ..Self::default()
        }
    }

    pub fn backoff_type(&self) -> BackoffType {
        self.policy_type.unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval < 0 {
            return Err(Error::InvalidRetryPolicy(format!(
                "interval must not be negative, got {}",
                self.interval
            )));
        }
        if self.max_retry_count < 0 {
            return Err(Error::InvalidRetryPolicy(format!(
                "max_retry_count must not be negative, got {}",
                self.max_retry_count
            )));
        }
        if self.max_interval < 0 {
            return Err(Error::InvalidRetryPolicy(format!(
                "max_interval must not be negative, got {}",
                self.max_interval
            )));
        }
        Ok(())
    }

    /// Wait durations between attempts, exactly `max_retry_count` of them.
    pub fn backoff(&self) -> Result<Vec<Duration>> {
        self.validate()?;

        let base = Duration::from_millis(self.interval as u64);
        let cap = Duration::from_millis(self.max_interval as u64).max(base);
        let delays = (0..self.max_retry_count as u64)
            .map(|attempt| match self.backoff_type() {
                BackoffType::Constant => base,
                BackoffType::Exponential => {
                    let factor = u32::try_from(attempt)
                        .ok()
                        .and_then(|shift| 1u32.checked_shl(shift))
                        .unwrap_or(u32::MAX);
                    base.saturating_mul(factor).min(cap)
                }
            })
            .collect();

        Ok(delays)
    }
}

fn default_interval() -> i64 {
    200
}
fn default_max_retry_count() -> i64 {
    4
}
fn default_max_interval() -> i64 {
    30_000
}
