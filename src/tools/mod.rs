//! # Lookup Tools
//!
//! External query providers the agent can call: an encyclopedic lookup
//! ([`WikipediaTool`]), an academic paper search ([`ArxivTool`]) and a general
//! web search ([`DuckDuckGoTool`]). Each one turns a query string into a short
//! plain-text result.
//!
//! Tools know nothing about caching or retries; wrap them in a
//! [`ResilientInvoker`](crate::resilience::ResilientInvoker) for that.
//!
//! ## Error text
//!
//! The invoker decides whether to retry from the error's text alone. Provider
//! throttling (HTTP 429, DuckDuckGo's 202) is therefore reported as
//! [`ToolError::RateLimited`], whose message contains "ratelimit". Every other
//! failure is reported in words that do not.

mod arxiv;
mod duckduckgo;
mod http;
mod wikipedia;

pub use arxiv::{ArxivTool, DEFAULT_ENDPOINT as ARXIV_ENDPOINT};
pub use duckduckgo::{DuckDuckGoTool, DEFAULT_ENDPOINT as DUCKDUCKGO_ENDPOINT};
pub use http::{HttpSettings, SearchHttpClient};
pub use wikipedia::{WikipediaTool, DEFAULT_ENDPOINT as WIKIPEDIA_ENDPOINT};

use crate::types::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a lookup tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("HTTP transport error: {0}")]
    Http(reqwest::Error),

    #[error("{provider} returned HTTP {status}: {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} ratelimit: {message}")]
    RateLimited { provider: String, message: String },

    #[error("failed to parse {provider} response: {message}")]
    Parse { provider: String, message: String },

    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn failed(message: impl Into<String>) -> Self {
        ToolError::Failed(message.into())
    }
}

/// An external capability resolving a query string to a result string.
#[async_trait]
pub trait ToolCapability: Send + Sync {
    /// Name the agent uses to select this tool.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn run(&self, query: &str) -> Result<String, ToolError>;

    /// Function-calling description of this tool.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::query_tool(self.name(), self.description())
    }
}

/// Result shaping shared by the HTTP tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Documents fetched per query.
    pub top_k_results: usize,
    /// Character cap on the returned text.
    pub doc_content_chars_max: usize,
    /// Queries longer than this many characters are cut before sending.
    pub max_query_length: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            top_k_results: 1,
            doc_content_chars_max: 200,
            max_query_length: 300,
        }
    }
}

impl ToolSettings {
    pub fn with_top_k_results(mut self, k: usize) -> Self {
        self.top_k_results = k;
        self
    }

    pub fn with_doc_content_chars_max(mut self, n: usize) -> Self {
        self.doc_content_chars_max = n;
        self
    }
}

/// First `max_chars` characters of `text` (never splits a code point).
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Wraps a synchronous closure as a tool.
///
/// ```rust
/// use chat_search::tools::{FnTool, ToolCapability};
///
/// # tokio_test::block_on(async {
/// let echo = FnTool::new("echo", "Returns the query", |q: &str| Ok(q.to_uppercase()));
/// assert_eq!(echo.run("hi").await.unwrap(), "HI");
/// # });
/// ```
pub struct FnTool<F> {
    name: String,
    description: String,
    f: F,
}

impl<F> FnTool<F>
where
    F: Fn(&str) -> Result<String, ToolError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, description: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> ToolCapability for FnTool<F>
where
    F: Fn(&str) -> Result<String, ToolError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, query: &str) -> Result<String, ToolError> {
        (self.f)(query)
    }
}
