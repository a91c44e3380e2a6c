//! Retry options and the exponential backoff schedule.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Total number of tool calls allowed, including the first one.
    pub max_attempts: u32,
    /// Wait before the first retry, in seconds.
    pub initial_wait_seconds: f64,
    /// Factor applied to the wait after every rate-limited attempt.
    pub backoff_multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_wait_seconds: 1.0,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_initial_wait_seconds(mut self, seconds: f64) -> Self {
        self.initial_wait_seconds = seconds;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Waits in the order the invoker would sleep them.
    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule::new(self.initial_wait_seconds, self.backoff_multiplier)
    }

    /// Upper bound on the time one invocation can spend sleeping.
    ///
    /// A wait follows every rate-limited attempt, the last one included.
    pub fn max_total_wait(&self) -> Duration {
        self.schedule()
            .take(self.max_attempts as usize)
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }

    /// Reject values the invoker cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(invalid(
                "max_attempts must be at least 1",
                "retry.max_attempts",
                "0",
            ));
        }
        if !self.initial_wait_seconds.is_finite() || self.initial_wait_seconds < 0.0 {
            return Err(invalid(
                "initial_wait_seconds must be a finite, non-negative number",
                "retry.initial_wait_seconds",
                &self.initial_wait_seconds.to_string(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 0.0 {
            return Err(invalid(
                "backoff_multiplier must be a finite, non-negative number",
                "retry.backoff_multiplier",
                &self.backoff_multiplier.to_string(),
            ));
        }
        Ok(())
    }
}

fn invalid(message: &str, field: &str, actual: &str) -> Error {
    Error::configuration_with_context(
        message,
        ErrorContext::new()
            .with_field_path(field)
            .with_details(format!("got {}", actual))
            .with_source("retry_options"),
    )
}

/// Infinite iterator over backoff waits: `initial`, `initial * m`, `initial * m^2`, ...
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    next_seconds: f64,
    multiplier: f64,
}

impl BackoffSchedule {
    pub fn new(initial_seconds: f64, multiplier: f64) -> Self {
        Self {
            next_seconds: initial_seconds,
            multiplier,
        }
    }

    /// Wait that the next call to `next()` will yield, in seconds.
    pub fn peek_seconds(&self) -> f64 {
        self.next_seconds
    }
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next_seconds;
        self.next_seconds = current * self.multiplier;
        Some(seconds_to_duration(current))
    }
}

/// Out-of-range values (negative, NaN, overflow) saturate instead of panicking.
pub(crate) fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}
