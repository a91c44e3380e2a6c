//! Suspension primitive used between retries.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Suspends the calling task for a backoff wait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real suspension through the tokio timer. The task yields its worker thread
/// while waiting.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested waits and returns immediately.
///
/// Useful for tests and dry runs where the schedule matters but wall-clock
/// time does not.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every wait requested so far, in order.
    pub fn waits(&self) -> Vec<Duration> {
        self.waits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requested waits as seconds.
    pub fn wait_seconds(&self) -> Vec<f64> {
        self.waits().iter().map(Duration::as_secs_f64).collect()
    }

    pub fn total(&self) -> Duration {
        self.waits().into_iter().sum()
    }

    pub fn clear(&self) {
        self.waits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        tokio::task::yield_now().await;
    }
}
