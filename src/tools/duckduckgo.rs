//! General web search through the DuckDuckGo instant-answer API.

use super::http::SearchHttpClient;
use super::{truncate_chars, ToolCapability, ToolError, ToolSettings};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

pub const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com/";
const PROVIDER: &str = "DuckDuckGo";
const NO_RESULT: &str = "No good DuckDuckGo Search Result was found";

/// Web search returning the abstract and related-topic snippets, space-joined.
pub struct DuckDuckGoTool {
    http: SearchHttpClient,
    endpoint: String,
    settings: ToolSettings,
    max_results: usize,
}

impl DuckDuckGoTool {
    pub fn new(http: SearchHttpClient, settings: ToolSettings) -> Self {
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            settings,
            max_results: 5,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }
}

#[async_trait]
impl ToolCapability for DuckDuckGoTool {
    fn name(&self) -> &str {
        "Search"
    }

    fn description(&self) -> &str {
        "A wrapper around DuckDuckGo Search. Useful for when you need to answer \
         questions about current events. Input should be a search query."
    }

    async fn run(&self, query: &str) -> Result<String, ToolError> {
        let query = truncate_chars(query, self.settings.max_query_length);
        let params = [
            ("q", query),
            ("format", "json".to_string()),
            ("no_html", "1".to_string()),
            ("no_redirect", "1".to_string()),
            ("skip_disambig", "1".to_string()),
        ];
        let (status, body) = self.http.get_text(PROVIDER, &self.endpoint, &params).await?;

        // DuckDuckGo answers 202 with an empty page when it throttles a client.
        if status == StatusCode::ACCEPTED {
            return Err(ToolError::RateLimited {
                provider: PROVIDER.to_string(),
                message: "HTTP 202".to_string(),
            });
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| ToolError::Parse {
            provider: PROVIDER.to_string(),
            message: e.to_string(),
        })?;

        let snippets = collect_snippets(&value, self.max_results);
        if snippets.is_empty() {
            return Ok(NO_RESULT.to_string());
        }
        Ok(truncate_chars(
            &snippets.join(" "),
            self.settings.doc_content_chars_max,
        ))
    }
}

/// Abstract (or direct answer) first, then related topics in document order.
pub(crate) fn collect_snippets(value: &Value, max_results: usize) -> Vec<String> {
    let mut snippets = Vec::new();

    for key in ["AbstractText", "Answer", "Definition"] {
        if let Some(text) = non_empty(value.get(key)) {
            snippets.push(text);
            break;
        }
    }

    if let Some(topics) = value.get("RelatedTopics").and_then(Value::as_array) {
        push_topics(topics, &mut snippets);
    }

    snippets.truncate(max_results);
    snippets
}

fn push_topics(topics: &[Value], out: &mut Vec<String>) {
    for topic in topics {
        if let Some(text) = non_empty(topic.get("Text")) {
            out.push(text);
        } else if let Some(nested) = topic.get("Topics").and_then(Value::as_array) {
            push_topics(nested, out);
        }
    }
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
