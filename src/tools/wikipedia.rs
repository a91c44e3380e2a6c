//! Encyclopedic lookup through the MediaWiki action API.

use super::http::SearchHttpClient;
use super::{truncate_chars, ToolCapability, ToolError, ToolSettings};
use async_trait::async_trait;
use serde_json::Value;

pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
const PROVIDER: &str = "Wikipedia";
const NO_RESULT: &str = "No good Wikipedia Search Result was found";

/// Searches Wikipedia and returns `Page:` / `Summary:` blocks for the top hits.
pub struct WikipediaTool {
    http: SearchHttpClient,
    endpoint: String,
    settings: ToolSettings,
}

impl WikipediaTool {
    pub fn new(http: SearchHttpClient, settings: ToolSettings) -> Self {
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            settings,
        }
    }

    /// Point at another MediaWiki `api.php` (other language editions, mock servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let params = [
            ("action", "query".to_string()),
            ("list", "search".to_string()),
            ("srsearch", query.to_string()),
            ("srlimit", self.settings.top_k_results.to_string()),
            ("format", "json".to_string()),
            ("formatversion", "2".to_string()),
        ];
        let (_, body) = self.http.get_json(PROVIDER, &self.endpoint, &params).await?;
        let hits = body
            .pointer("/query/search")
            .and_then(Value::as_array)
            .ok_or_else(|| parse_error("missing query.search"))?;

        Ok(hits
            .iter()
            .filter_map(|hit| hit.get("title").and_then(Value::as_str))
            .take(self.settings.top_k_results)
            .map(str::to_string)
            .collect())
    }

    async fn summary(&self, title: &str) -> Result<Option<(String, String)>, ToolError> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "extracts".to_string()),
            ("exintro", "1".to_string()),
            ("explaintext", "1".to_string()),
            ("redirects", "1".to_string()),
            ("titles", title.to_string()),
            ("format", "json".to_string()),
            ("formatversion", "2".to_string()),
        ];
        let (_, body) = self.http.get_json(PROVIDER, &self.endpoint, &params).await?;
        let pages = body
            .pointer("/query/pages")
            .and_then(Value::as_array)
            .ok_or_else(|| parse_error("missing query.pages"))?;

        // Missing pages and pages without an intro are skipped.
        Ok(pages.iter().find_map(|page| {
            let extract = page.get("extract").and_then(Value::as_str)?.trim();
            if extract.is_empty() {
                return None;
            }
            let title = page.get("title").and_then(Value::as_str).unwrap_or(title);
            Some((title.to_string(), extract.to_string()))
        }))
    }
}

fn parse_error(message: &str) -> ToolError {
    ToolError::Parse {
        provider: PROVIDER.to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl ToolCapability for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "A wrapper around Wikipedia. Useful for answering general questions about \
         people, places, companies, facts, historical events, or other subjects. \
         Input should be a search query."
    }

    async fn run(&self, query: &str) -> Result<String, ToolError> {
        let query = truncate_chars(query, self.settings.max_query_length);
        let titles = self.search_titles(&query).await?;

        let mut blocks = Vec::with_capacity(titles.len());
        for title in &titles {
            if let Some((page, extract)) = self.summary(title).await? {
                blocks.push(format!("Page: {}\nSummary: {}", page, extract));
            }
        }

        if blocks.is_empty() {
            return Ok(NO_RESULT.to_string());
        }
        Ok(truncate_chars(
            &blocks.join("\n\n"),
            self.settings.doc_content_chars_max,
        ))
    }
}
