//! Resilient Lookup Example
//!
//! Runs one question through each lookup tool twice, showing that the second
//! round is served from the session cache. Retry warnings are printed to
//! stderr while a provider is throttling.
//!
//! Usage:
//!   cargo run --example resilient_lookup
//!   cargo run --example resilient_lookup -- "quantum error correction"
//!
//!   # Fewer, faster retries
//!   CHAT_SEARCH_MAX_ATTEMPTS=2 CHAT_SEARCH_INITIAL_WAIT_SECS=0.5 cargo run --example resilient_lookup

use chat_search::warning::ConsoleWarningSink;
use chat_search::{ResearchSession, SearchConfig};
use std::env;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let question = env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let question = if question.is_empty() {
        "large language models".to_string()
    } else {
        question
    };

    let session = ResearchSession::from_config(&SearchConfig::from_env()?)?
        .with_warning_sink(Arc::new(ConsoleWarningSink::default()));

    println!("🔎 Question: {}\n", question);

    for round in 1..=2 {
        println!("=== Round {} ===", round);
        for tool in session.tool_names() {
            let started = Instant::now();
            match session.lookup(&tool, &question).await {
                Ok(text) => println!(
                    "[{}] ({:?})\n{}\n",
                    tool,
                    started.elapsed(),
                    ResearchSession::answer_text(&text)
                ),
                Err(e) => println!("[{}] {}\n", tool, ResearchSession::error_text(&e)),
            }
        }
    }

    println!("=== Stats ===");
    for tool in session.tool_names() {
        if let Some(stats) = session.stats(&tool) {
            println!(
                "{:<10} calls={} hits={} hit_ratio={:.2}",
                tool,
                stats.tool_calls,
                stats.cache_hits,
                stats.hit_ratio()
            );
        }
    }

    Ok(())
}
