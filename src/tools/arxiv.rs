//! Academic paper search through the arXiv Atom API.

use super::http::SearchHttpClient;
use super::{truncate_chars, ToolCapability, ToolError, ToolSettings};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_ENDPOINT: &str = "https://export.arxiv.org/api/query";
const PROVIDER: &str = "arXiv";
const NO_RESULT: &str = "No good Arxiv Result was found";

static ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<entry>(.*?)</entry>").expect("static regex"));
static AUTHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").expect("static regex"));
static FEED: Lazy<Regex> = Lazy::new(|| Regex::new(r"<feed[\s>]").expect("static regex"));
// New-style (2301.00001v2) and old-style (hep-th/9901001) identifiers.
static ARXIV_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}(0[1-9]|1[0-2])\.\d{4,5}|[a-z\-]+(\.[A-Z]{2})?/\d{7})(v\d+)?$")
        .expect("static regex")
});

/// A single parsed feed entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Paper {
    pub id: String,
    pub date: String,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
}

impl Paper {
    fn render(&self) -> String {
        format!(
            "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
            self.date,
            self.title,
            self.authors.join(", "),
            self.summary
        )
    }
}

/// Searches arXiv and returns metadata blocks for the top papers.
pub struct ArxivTool {
    http: SearchHttpClient,
    endpoint: String,
    settings: ToolSettings,
}

impl ArxivTool {
    pub fn new(http: SearchHttpClient, settings: ToolSettings) -> Self {
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            settings,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn params(&self, query: &str) -> Vec<(&'static str, String)> {
        let max_results = ("max_results", self.settings.top_k_results.to_string());
        if is_arxiv_identifier(query) {
            vec![
                ("id_list", query.split_whitespace().collect::<Vec<_>>().join(",")),
                max_results,
            ]
        } else {
            vec![
                ("search_query", query.to_string()),
                ("start", "0".to_string()),
                max_results,
            ]
        }
    }
}

#[async_trait]
impl ToolCapability for ArxivTool {
    fn name(&self) -> &str {
        "arxiv"
    }

    fn description(&self) -> &str {
        "A wrapper around Arxiv.org. Useful for answering questions about physics, \
         mathematics, computer science, quantitative biology, quantitative finance, \
         statistics, electrical engineering, and economics from scientific articles \
         on arxiv.org. Input should be a search query."
    }

    async fn run(&self, query: &str) -> Result<String, ToolError> {
        let query = truncate_chars(query, self.settings.max_query_length);
        let params = self.params(&query);
        let (_, body) = self.http.get_text(PROVIDER, &self.endpoint, &params).await?;

        let papers = parse_feed(&body)?;
        if papers.is_empty() {
            return Ok(NO_RESULT.to_string());
        }
        let text = papers
            .iter()
            .take(self.settings.top_k_results)
            .map(Paper::render)
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(truncate_chars(&text, self.settings.doc_content_chars_max))
    }
}

/// True when every whitespace-separated token looks like an arXiv identifier.
pub(crate) fn is_arxiv_identifier(query: &str) -> bool {
    let mut tokens = query.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(|t| ARXIV_ID.is_match(t))
}

pub(crate) fn parse_feed(xml: &str) -> Result<Vec<Paper>, ToolError> {
    if !FEED.is_match(xml) {
        return Err(ToolError::Parse {
            provider: PROVIDER.to_string(),
            message: "response is not an Atom feed".to_string(),
        });
    }

    Ok(ENTRY
        .captures_iter(xml)
        .filter_map(|cap| cap.get(1))
        .map(|entry| parse_entry(entry.as_str()))
        // arXiv reports bad queries as an entry pointing at its error page.
        .filter(|paper| !paper.id.contains("/api/errors"))
        .collect())
}

fn parse_entry(entry: &str) -> Paper {
    let date = element(entry, "updated")
        .or_else(|| element(entry, "published"))
        .map(|d| d.chars().take(10).collect())
        .unwrap_or_default();
    Paper {
        id: element(entry, "id").unwrap_or_default(),
        date,
        title: element(entry, "title").unwrap_or_default(),
        authors: AUTHOR
            .captures_iter(entry)
            .filter_map(|cap| cap.get(1))
            .map(|m| clean_text(m.as_str()))
            .collect(),
        summary: element(entry, "summary").unwrap_or_default(),
    }
}

/// Text of the first `<tag>` element, unescaped and whitespace-collapsed.
fn element(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)?;
    let content_start = start + xml[start..].find('>')? + 1;
    let end = content_start + xml[content_start..].find(&close)?;
    Some(clean_text(&xml[content_start..end]))
}

fn clean_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:attention</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <updated>2023-08-02T00:41:18Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on complex
 recurrent &amp; convolutional neural networks.</summary>
    <author>
      <name>Ashish Vaswani</name>
    </author>
    <author>
      <name>Noam Shazeer</name>
    </author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let papers = parse_feed(FEED_XML).unwrap();
        assert_eq!(papers.len(), 1);
        let p = &papers[0];
        assert_eq!(p.date, "2023-08-02");
        assert_eq!(p.title, "Attention Is All You Need");
        assert_eq!(p.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(
            p.summary,
            "The dominant sequence transduction models are based on complex recurrent & convolutional neural networks."
        );
    }

    #[test]
    fn test_render() {
        let papers = parse_feed(FEED_XML).unwrap();
        assert!(papers[0].render().starts_with(
            "Published: 2023-08-02\nTitle: Attention Is All You Need\nAuthors: Ashish Vaswani, Noam Shazeer\nSummary: "
        ));
    }

    #[test]
    fn test_empty_and_error_feeds() {
        let empty = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>x</title></feed>"#;
        assert!(parse_feed(empty).unwrap().is_empty());

        let error = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id><title>Error</title><summary>incorrect id format</summary></entry></feed>"#;
        assert!(parse_feed(error).unwrap().is_empty());

        assert!(matches!(
            parse_feed("<html>oops</html>"),
            Err(ToolError::Parse { .. })
        ));
    }

    #[test]
    fn test_identifier_detection() {
        assert!(is_arxiv_identifier("1706.03762"));
        assert!(is_arxiv_identifier("2301.00001v2 1706.03762"));
        assert!(is_arxiv_identifier("hep-th/9901001"));
        assert!(!is_arxiv_identifier("attention is all you need"));
        assert!(!is_arxiv_identifier("1706.03762 transformers"));
        assert!(!is_arxiv_identifier(""));
    }
}
