//! One conversational session: the tools an agent may call, each behind its
//! own cache and resilient invoker.

use crate::cache::QueryCache;
use crate::config::SearchConfig;
use crate::resilience::{InvokeStats, ResilientInvoker, RetryOptions, Sleeper, TokioSleeper};
use crate::tools::{ArxivTool, DuckDuckGoTool, SearchHttpClient, ToolCapability, WikipediaTool};
use crate::types::ToolDefinition;
use crate::warning::{TracingWarningSink, WarningSink};
use crate::{Error, ErrorContext, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// First assistant message of a new conversation.
pub const GREETING: &str = "Hi, I'm a chatbot who can search the web. How can I help you?";

/// Reply used when the agent produced nothing useful.
pub const NO_ANSWER: &str =
    "I couldn't find a proper answer to your query. Please try rephrasing it.";

struct Registered {
    tool: Arc<dyn ToolCapability>,
    invoker: ResilientInvoker,
}

/// Tools registered by name, each resolving through a session-scoped cache.
///
/// Caches are kept per tool so that the same query sent to two providers
/// yields each provider's own answer.
pub struct ResearchSession {
    tools: BTreeMap<String, Registered>,
    options: RetryOptions,
    sleeper: Arc<dyn Sleeper>,
    warnings: Arc<dyn WarningSink>,
}

impl ResearchSession {
    pub fn new(options: RetryOptions) -> Self {
        Self {
            tools: BTreeMap::new(),
            options,
            sleeper: Arc::new(TokioSleeper),
            warnings: Arc::new(TracingWarningSink),
        }
    }

    /// Session with the Wikipedia, arXiv and DuckDuckGo tools.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        config.validate()?;
        let http = SearchHttpClient::new(&config.http)?;

        let search = DuckDuckGoTool::new(http.clone(), config.tools.clone())
            .with_endpoint(config.endpoints.duckduckgo.clone());
        let arxiv = ArxivTool::new(http.clone(), config.tools.clone())
            .with_endpoint(config.endpoints.arxiv.clone());
        let wiki = WikipediaTool::new(http, config.tools.clone())
            .with_endpoint(config.endpoints.wikipedia.clone());

        Ok(Self::new(config.retry.clone())
            .with_tool(Arc::new(search))
            .with_tool(Arc::new(arxiv))
            .with_tool(Arc::new(wiki)))
    }

    /// Replaces the sleeper for every tool, keeping cached results and stats.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self.rewire_invokers();
        self
    }

    /// Replaces the warning sink for every tool, keeping cached results and stats.
    pub fn with_warning_sink(mut self, sink: Arc<dyn WarningSink>) -> Self {
        self.warnings = sink;
        self.rewire_invokers();
        self
    }

    /// Register `tool` under its own name, replacing any tool with that name.
    pub fn with_tool(mut self, tool: Arc<dyn ToolCapability>) -> Self {
        self.register(tool);
        self
    }

    pub fn register(&mut self, tool: Arc<dyn ToolCapability>) {
        let invoker = self.invoker(Arc::new(QueryCache::new()));
        self.tools
            .insert(tool.name().to_string(), Registered { tool, invoker });
    }

    fn invoker(&self, cache: Arc<QueryCache>) -> ResilientInvoker {
        ResilientInvoker::new(cache)
            .with_options(self.options.clone())
            .with_sleeper(Arc::clone(&self.sleeper))
            .with_warning_sink(Arc::clone(&self.warnings))
    }

    fn rewire_invokers(&mut self) {
        let tools = std::mem::take(&mut self.tools);
        self.tools = tools
            .into_iter()
            .map(|(name, entry)| {
                let invoker = entry
                    .invoker
                    .with_sleeper(Arc::clone(&self.sleeper))
                    .with_warning_sink(Arc::clone(&self.warnings));
                (
                    name,
                    Registered {
                        tool: entry.tool,
                        invoker,
                    },
                )
            })
            .collect();
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Function-calling definitions for every registered tool.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|r| r.tool.definition()).collect()
    }

    /// Resolve `query` with the named tool, through its cache.
    pub async fn lookup(&self, tool_name: &str, query: &str) -> Result<String> {
        let entry = self.tools.get(tool_name).ok_or_else(|| {
            Error::validation_with_context(
                format!("unknown tool: {}", tool_name),
                ErrorContext::new()
                    .with_field_path("tool")
                    .with_details(format!("available: {}", self.tool_names().join(", ")))
                    .with_source("research_session"),
            )
        })?;
        entry.invoker.invoke(entry.tool.as_ref(), query).await
    }

    pub fn stats(&self, tool_name: &str) -> Option<InvokeStats> {
        self.tools.get(tool_name).map(|r| r.invoker.stats())
    }

    pub fn cache(&self, tool_name: &str) -> Option<&Arc<QueryCache>> {
        self.tools.get(tool_name).map(|r| r.invoker.cache())
    }

    /// Text shown to the user for an agent response.
    pub fn answer_text(response: &str) -> String {
        if response.is_empty() || response.to_lowercase() == "none" {
            NO_ANSWER.to_string()
        } else {
            response.to_string()
        }
    }

    /// Text shown to the user when a turn failed.
    pub fn error_text(error: &Error) -> String {
        format!("An error occurred: {}", error)
    }
}
