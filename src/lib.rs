//! # chat-search
//!
//! Cached, rate-limit-aware lookup tools for search-enabled chat agents.
//!
//! ## Overview
//!
//! A chat agent answering questions calls out to lookup tools: Wikipedia for
//! encyclopedic facts, arXiv for papers, DuckDuckGo for the open web. Those
//! providers throttle aggressively and agents repeat themselves, so every tool
//! call goes through a [`ResilientInvoker`] that
//!
//! - serves repeated queries from a session-scoped [`QueryCache`],
//! - retries rate-limited calls with exponential backoff, warning the user
//!   before each wait,
//! - hands every other failure back to the caller untouched.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chat_search::{ResearchSession, SearchConfig};
//!
//! #[tokio::main]
//! async fn main() -> chat_search::Result<()> {
//!     let session = ResearchSession::from_config(&SearchConfig::from_env()?)?;
//!
//!     let summary = session.lookup("wikipedia", "machine learning").await?;
//!     println!("{}", summary);
//!
//!     // Served from the cache; Wikipedia is not called again.
//!     let again = session.lookup("wikipedia", "machine learning").await?;
//!     assert_eq!(summary, again);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Write-once query cache |
//! | [`resilience`] | Invoker, retry options, failure classification, sleepers |
//! | [`tools`] | Tool trait and the Wikipedia / arXiv / DuckDuckGo clients |
//! | [`warning`] | Sinks for user-visible retry warnings |
//! | [`config`] | YAML and environment configuration |
//! | [`session`] | Per-conversation wiring of tools and caches |
//! | [`types`] | Function-calling tool definitions |

pub mod cache;
pub mod config;
pub mod resilience;
pub mod session;
pub mod tools;
pub mod types;
pub mod warning;

// Re-export main types for convenience
pub use cache::QueryCache;
pub use config::SearchConfig;
pub use resilience::{InvokeStats, ResilientInvoker, RetryOptions};
pub use session::ResearchSession;
pub use tools::{ToolCapability, ToolError};
pub use warning::WarningSink;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
