//! Behavioural properties of the resilient invoker, exercised through the
//! public API with scripted tools and a recording sleeper.

use async_trait::async_trait;
use chat_search::cache::QueryCache;
use chat_search::resilience::{
    classify_failure, FailureClass, RecordingSleeper, ResilientInvoker, RetryOptions,
};
use chat_search::tools::{FnTool, ToolCapability, ToolError};
use chat_search::warning::InMemoryWarningSink;
use chat_search::Error;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays a fixed list of outcomes, one per call, then repeats the last one.
struct ScriptedTool {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicU32,
}

impl ScriptedTool {
    fn new(script: Vec<Result<&str, &str>>) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolCapability for ScriptedTool {
    fn name(&self) -> &str {
        "scripted"
    }

    fn description(&self) -> &str {
        "Replays canned outcomes"
    }

    async fn run(&self, _query: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        };
        next.map_err(ToolError::failed)
    }
}

/// Counts calls and yields to the scheduler before answering.
struct SlowTool {
    calls: AtomicU32,
}

#[async_trait]
impl ToolCapability for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "Answers after a short delay"
    }

    async fn run(&self, query: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(format!("answer for {}", query))
    }
}

fn invoker(
    options: RetryOptions,
) -> (
    ResilientInvoker,
    Arc<RecordingSleeper>,
    Arc<InMemoryWarningSink>,
) {
    let sleeper = Arc::new(RecordingSleeper::new());
    let warnings = Arc::new(InMemoryWarningSink::new());
    let inv = ResilientInvoker::new(Arc::new(QueryCache::new()))
        .with_options(options)
        .with_sleeper(sleeper.clone())
        .with_warning_sink(warnings.clone());
    (inv, sleeper, warnings)
}

#[tokio::test]
async fn test_repeated_query_calls_tool_once() {
    let (inv, _, _) = invoker(RetryOptions::default());
    let tool = ScriptedTool::new(vec![Ok("Paris")]);

    let first = inv.invoke(&tool, "capital of France").await.unwrap();
    let second = inv.invoke(&tool, "capital of France").await.unwrap();

    assert_eq!(first, "Paris");
    assert_eq!(first, second);
    assert_eq!(tool.calls(), 1);
    assert_eq!(inv.stats().cache_hits, 1);
}

#[tokio::test]
async fn test_cache_key_is_verbatim() {
    let (inv, _, _) = invoker(RetryOptions::default());
    let calls = AtomicU32::new(0);
    let tool = FnTool::new("echo", "", |q: &str| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(q.to_string())
    });

    inv.invoke(&tool, "Rust").await.unwrap();
    inv.invoke(&tool, "rust").await.unwrap();
    inv.invoke(&tool, " Rust").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(inv.cache().len(), 3);
}

#[tokio::test]
async fn test_cache_is_write_once() {
    let cache = QueryCache::new();
    assert!(cache.put("q", "r1").await);
    assert!(!cache.put("q", "r2").await);
    assert_eq!(cache.get("q").as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_backoff_schedule_until_success() {
    let max = 5;
    let mut script = vec![Err("ratelimit reached"); (max - 1) as usize];
    script.push(Ok("finally"));
    let tool = ScriptedTool::new(script);
    let (inv, sleeper, warnings) = invoker(
        RetryOptions::new()
            .with_max_attempts(max)
            .with_initial_wait_seconds(0.5)
            .with_backoff_multiplier(3.0),
    );

    assert_eq!(inv.invoke(&tool, "q").await.unwrap(), "finally");
    assert_eq!(tool.calls(), max);
    assert_eq!(sleeper.wait_seconds(), vec![0.5, 1.5, 4.5, 13.5]);
    assert_eq!(warnings.len(), (max - 1) as usize);
    assert_eq!(
        warnings.messages()[1],
        "Rate limit hit. Retrying in 1.5 seconds..."
    );
}

#[tokio::test]
async fn test_non_retryable_error_is_returned_untouched() {
    let tool = ScriptedTool::new(vec![Err("invalid api key"), Ok("unreachable")]);
    let (inv, sleeper, warnings) = invoker(RetryOptions::default());

    let err = inv.invoke(&tool, "q").await.unwrap_err();
    match &err {
        Error::Tool(ToolError::Failed(message)) => assert_eq!(message, "invalid api key"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "invalid api key");
    assert_eq!(tool.calls(), 1);
    assert!(sleeper.waits().is_empty());
    assert!(warnings.is_empty());
    assert!(!inv.cache().contains("q"));
}

#[tokio::test]
async fn test_rate_limit_then_hard_failure() {
    let tool = ScriptedTool::new(vec![Err("ratelimit"), Err("upstream exploded")]);
    let (inv, sleeper, _) = invoker(RetryOptions::default());

    let err = inv.invoke(&tool, "q").await.unwrap_err();
    assert_eq!(err.to_string(), "upstream exploded");
    assert_eq!(tool.calls(), 2);
    assert_eq!(sleeper.wait_seconds(), vec![1.0]);
}

#[tokio::test]
async fn test_exhaustion_reports_query_and_attempts() {
    let tool = ScriptedTool::new(vec![Err("Service RATELIMIT hit")]);
    let (inv, sleeper, _) = invoker(RetryOptions::new().with_max_attempts(4));

    let err = inv.invoke(&tool, "busy").await.unwrap_err();
    assert!(err.is_retry_exhausted());
    assert!(matches!(
        &err,
        Error::RetryExhausted { query, attempts: 4 } if query == "busy"
    ));
    assert!(err
        .to_string()
        .starts_with("Rate limit exceeded. Please try again later."));
    assert_eq!(tool.calls(), 4);
    assert_eq!(sleeper.total(), Duration::from_secs(1 + 2 + 4 + 8));
    assert!(inv.cache().is_empty());
}

#[tokio::test]
async fn test_scenario_from_calculator_session() {
    let tool = ScriptedTool::new(vec![
        Err("ratelimit: too many requests"),
        Err("ratelimit: too many requests"),
        Ok("42"),
    ]);
    let (inv, sleeper, _) = invoker(
        RetryOptions::new()
            .with_max_attempts(3)
            .with_initial_wait_seconds(1.0)
            .with_backoff_multiplier(2.0),
    );

    assert_eq!(inv.invoke(&tool, "6 * 7").await.unwrap(), "42");
    assert_eq!(sleeper.wait_seconds(), vec![1.0, 2.0]);
    assert_eq!(inv.cache().get("6 * 7").as_deref(), Some("42"));
}

#[test]
fn test_classification_examples() {
    for text in ["RateLimit Exceeded", "ratelimit", "Service RATELIMIT hit"] {
        assert_eq!(
            classify_failure(&ToolError::failed(text)),
            FailureClass::RateLimited,
            "{text:?} should be retried"
        );
    }
    for text in ["Rate Limit", "rate-limit", "timeout", ""] {
        assert_eq!(
            classify_failure(&ToolError::failed(text)),
            FailureClass::NonRetryable,
            "{text:?} should not be retried"
        );
    }
}

#[tokio::test]
async fn test_concurrent_first_lookups_share_one_call() {
    let (inv, _, _) = invoker(RetryOptions::default());
    let tool = SlowTool {
        calls: AtomicU32::new(0),
    };

    let lookups = (0..8).map(|_| inv.invoke(&tool, "same question"));
    let results = futures::future::join_all(lookups).await;

    for result in results {
        assert_eq!(result.unwrap(), "answer for same question");
    }
    assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    assert_eq!(inv.cache().len(), 1);
}

#[tokio::test]
async fn test_concurrent_distinct_queries_run_independently() {
    let (inv, _, _) = invoker(RetryOptions::default());
    let tool = SlowTool {
        calls: AtomicU32::new(0),
    };

    let queries = ["a", "b", "c"];
    let results =
        futures::future::join_all(queries.iter().map(|q| inv.invoke(&tool, q))).await;

    for (q, r) in queries.iter().zip(results) {
        assert_eq!(r.unwrap(), format!("answer for {}", q));
    }
    assert_eq!(tool.calls.load(Ordering::SeqCst), 3);
}

/// Fails its first call after a delay, succeeds afterwards.
struct FailsOnceTool {
    calls: AtomicU32,
}

#[async_trait]
impl ToolCapability for FailsOnceTool {
    fn name(&self) -> &str {
        "fails_once"
    }

    fn description(&self) -> &str {
        "Fails the first call"
    }

    async fn run(&self, query: &str) -> Result<String, ToolError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        if call == 0 {
            Err(ToolError::failed("connection reset"))
        } else {
            Ok(format!("answer for {}", query))
        }
    }
}

#[tokio::test]
async fn test_waiter_resolves_after_concurrent_failure() {
    let (inv, sleeper, _) = invoker(RetryOptions::default());
    let tool = FailsOnceTool {
        calls: AtomicU32::new(0),
    };

    let results =
        futures::future::join_all((0..2).map(|_| inv.invoke(&tool, "shared"))).await;

    assert_eq!(results[0].as_ref().unwrap_err().to_string(), "connection reset");
    assert_eq!(results[1].as_deref().unwrap(), "answer for shared");
    assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
    assert_eq!(inv.cache().get("shared").as_deref(), Some("answer for shared"));
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn test_put_during_failed_lookup_is_stored() {
    let (inv, _, _) = invoker(RetryOptions::default());
    let tool = FailsOnceTool {
        calls: AtomicU32::new(0),
    };

    let lookup = inv.invoke(&tool, "q");
    let manual = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        inv.cache().put("q", "manual").await
    };
    let (outcome, stored) = tokio::join!(lookup, manual);

    assert_eq!(outcome.unwrap_err().to_string(), "connection reset");
    assert!(stored);
    assert_eq!(inv.cache().get("q").as_deref(), Some("manual"));
    assert_eq!(inv.invoke(&tool, "q").await.unwrap(), "manual");
    assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
}
