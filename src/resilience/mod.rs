//! # Resilient Invocation Module
//!
//! Wraps lookup tools with memoization and rate-limit-aware retries.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResilientInvoker`] | Cache lookup, tool call, classification, backoff |
//! | [`RetryOptions`] | `max_attempts`, `initial_wait_seconds`, `backoff_multiplier` |
//! | [`BackoffSchedule`] | The sequence of waits between attempts |
//! | [`classify_failure`] | The "ratelimit" substring rule |
//! | [`Sleeper`] | Suspension between attempts ([`TokioSleeper`], [`RecordingSleeper`]) |
//!
//! ## Retry policy
//!
//! A failure is retried only when its text contains `ratelimit`, compared
//! case-insensitively. The wait starts at `initial_wait_seconds` and is
//! multiplied by `backoff_multiplier` after each rate-limited attempt; a
//! warning is emitted before every wait. Any other failure is returned on the
//! spot. When `max_attempts` calls were all rate limited the invocation ends in
//! [`Error::RetryExhausted`](crate::Error::RetryExhausted).
//!
//! ```rust
//! use chat_search::cache::QueryCache;
//! use chat_search::resilience::{RecordingSleeper, ResilientInvoker, RetryOptions};
//! use chat_search::tools::{FnTool, ToolError};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! # tokio_test::block_on(async {
//! let sleeper = Arc::new(RecordingSleeper::new());
//! let invoker = ResilientInvoker::new(Arc::new(QueryCache::new()))
//!     .with_options(RetryOptions::new().with_max_attempts(3))
//!     .with_sleeper(sleeper.clone());
//!
//! let calls = AtomicU32::new(0);
//! let tool = FnTool::new("flaky", "Fails once", |_q: &str| {
//!     if calls.fetch_add(1, Ordering::SeqCst) == 0 {
//!         Err(ToolError::failed("ratelimit: slow down"))
//!     } else {
//!         Ok("done".to_string())
//!     }
//! });
//!
//! assert_eq!(invoker.invoke(&tool, "q").await.unwrap(), "done");
//! assert_eq!(invoker.invoke(&tool, "q").await.unwrap(), "done");
//! assert_eq!(calls.load(Ordering::SeqCst), 2);
//! assert_eq!(sleeper.wait_seconds(), vec![1.0]);
//! # });
//! ```

mod backoff;
mod classify;
mod invoker;
mod sleeper;

pub use backoff::{BackoffSchedule, RetryOptions};
pub use classify::{classify_failure, is_rate_limit_text, FailureClass, RATE_LIMIT_MARKER};
pub use invoker::{InvokeStats, ResilientInvoker};
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};
