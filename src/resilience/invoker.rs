//! Cache-then-call wrapper with rate-limit backoff.

use super::backoff::RetryOptions;
use super::classify::{classify_failure, FailureClass};
use super::sleeper::{Sleeper, TokioSleeper};
use crate::cache::QueryCache;
use crate::tools::ToolCapability;
use crate::warning::{TracingWarningSink, WarningSink};
use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters describing what an invoker has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvokeStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Calls that reached the tool.
    pub tool_calls: u64,
    /// Tool calls that failed with a rate-limit error.
    pub rate_limited: u64,
    /// Invocations that ended in [`Error::RetryExhausted`].
    pub exhausted: u64,
    /// Invocations that ended in a non-retryable tool error.
    pub failures: u64,
}

impl InvokeStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    tool_calls: AtomicU64,
    rate_limited: AtomicU64,
    exhausted: AtomicU64,
    failures: AtomicU64,
}

impl AtomicStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn to_stats(&self) -> InvokeStats {
        InvokeStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            tool_calls: self.tool_calls.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Resolves queries through a tool, serving repeats from a [`QueryCache`].
///
/// On a miss the tool is called up to `max_attempts` times. Only failures whose
/// text contains "ratelimit" (any case) are retried, after a warning and an
/// exponentially growing wait; anything else is returned as [`Error::Tool`]
/// immediately. Successful results are cached; failures never are.
///
/// Concurrent misses for the same query share one resolution, so the tool sees
/// a single sequence of calls for them.
pub struct ResilientInvoker {
    cache: Arc<QueryCache>,
    options: RetryOptions,
    sleeper: Arc<dyn Sleeper>,
    warnings: Arc<dyn WarningSink>,
    stats: AtomicStats,
}

impl ResilientInvoker {
    /// Invoker with default options, real sleeps and `tracing` warnings.
    pub fn new(cache: Arc<QueryCache>) -> Self {
        Self {
            cache,
            options: RetryOptions::default(),
            sleeper: Arc::new(TokioSleeper),
            warnings: Arc::new(TracingWarningSink),
            stats: AtomicStats::default(),
        }
    }

    pub fn with_options(mut self, options: RetryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_warning_sink(mut self, sink: Arc<dyn WarningSink>) -> Self {
        self.warnings = sink;
        self
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    pub fn stats(&self) -> InvokeStats {
        self.stats.to_stats()
    }

    /// Resolve `query` with this invoker's default options.
    pub async fn invoke(&self, tool: &dyn ToolCapability, query: &str) -> Result<String> {
        self.invoke_with(tool, query, &self.options).await
    }

    /// Resolve `query` with explicit retry options.
    pub async fn invoke_with(
        &self,
        tool: &dyn ToolCapability,
        query: &str,
        options: &RetryOptions,
    ) -> Result<String> {
        if let Some(hit) = self.cache.get(query) {
            AtomicStats::bump(&self.stats.cache_hits);
            debug!(tool = tool.name(), query, "query cache hit");
            return Ok(hit);
        }
        AtomicStats::bump(&self.stats.cache_misses);
        debug!(tool = tool.name(), query, "query cache miss");

        let slot = self.cache.slot(query);
        let outcome = slot
            .get_or_try_init(|| self.resolve(tool, query, options))
            .await
            .cloned();
        if outcome.is_err() {
            self.cache.release(query, &slot);
        }
        outcome
    }

    /// The attempt loop. The caller stores the successful result.
    async fn resolve(
        &self,
        tool: &dyn ToolCapability,
        query: &str,
        options: &RetryOptions,
    ) -> Result<String> {
        let mut attempt: u32 = 0;
        let mut schedule = options.schedule();

        while attempt < options.max_attempts {
            AtomicStats::bump(&self.stats.tool_calls);
            info!(
                tool = tool.name(),
                attempt = attempt + 1,
                max_attempts = options.max_attempts,
                "calling tool"
            );

            let err = match tool.run(query).await {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };

            match classify_failure(&err) {
                FailureClass::RateLimited => {
                    AtomicStats::bump(&self.stats.rate_limited);
                    let wait_seconds = schedule.peek_seconds();
                    let wait = schedule.next().unwrap_or_default();
                    warn!(tool = tool.name(), error = %err, wait_seconds, "rate limited, backing off");
                    self.warnings.warn(&format!(
                        "Rate limit hit. Retrying in {} seconds...",
                        wait_seconds
                    ));
                    self.sleeper.sleep(wait).await;
                    attempt += 1;
                }
                FailureClass::NonRetryable => {
                    AtomicStats::bump(&self.stats.failures);
                    debug!(tool = tool.name(), error = %err, "non-retryable tool failure");
                    return Err(Error::Tool(err));
                }
            }
        }

        AtomicStats::bump(&self.stats.exhausted);
        Err(Error::RetryExhausted {
            query: query.to_string(),
            attempts: attempt,
        })
    }
}
