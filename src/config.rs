//! Session configuration.
//!
//! Everything has a default, so an empty YAML document is a valid config.
//! Environment variables override file values:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CHAT_SEARCH_MAX_ATTEMPTS` | `retry.max_attempts` |
//! | `CHAT_SEARCH_INITIAL_WAIT_SECS` | `retry.initial_wait_seconds` |
//! | `CHAT_SEARCH_BACKOFF_MULTIPLIER` | `retry.backoff_multiplier` |
//! | `CHAT_SEARCH_TOP_K` | `tools.top_k_results` |
//! | `CHAT_SEARCH_DOC_CHARS_MAX` | `tools.doc_content_chars_max` |
//! | `CHAT_SEARCH_HTTP_TIMEOUT_SECS` | `http.timeout_secs` |
//! | `CHAT_SEARCH_PROXY_URL` | `http.proxy_url` |
//!
//! ```yaml
//! retry:
//!   max_attempts: 3
//!   initial_wait_seconds: 0.5
//! tools:
//!   doc_content_chars_max: 400
//! endpoints:
//!   wikipedia: https://de.wikipedia.org/w/api.php
//! ```

use crate::resilience::RetryOptions;
use crate::tools::{HttpSettings, ToolSettings};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Environment variable the binary reads a config file path from.
pub const CONFIG_PATH_ENV: &str = "CHAT_SEARCH_CONFIG";

/// Base URLs of the lookup providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub wikipedia: String,
    pub arxiv: String,
    pub duckduckgo: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            wikipedia: crate::tools::WIKIPEDIA_ENDPOINT.to_string(),
            arxiv: crate::tools::ARXIV_ENDPOINT.to_string(),
            duckduckgo: crate::tools::DUCKDUCKGO_ENDPOINT.to_string(),
        }
    }
}

impl Endpoints {
    /// All three endpoints under one base URL (mock servers).
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            wikipedia: format!("{}/w/api.php", base),
            arxiv: format!("{}/api/query", base),
            duckduckgo: format!("{}/", base),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub retry: RetryOptions,
    pub tools: ToolSettings,
    pub http: HttpSettings,
    pub endpoints: Endpoints,
}

impl SearchConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file, then apply environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_yaml_str(&text)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<u32>("CHAT_SEARCH_MAX_ATTEMPTS") {
            self.retry.max_attempts = v;
        }
        if let Some(v) = env_parse::<f64>("CHAT_SEARCH_INITIAL_WAIT_SECS") {
            self.retry.initial_wait_seconds = v;
        }
        if let Some(v) = env_parse::<f64>("CHAT_SEARCH_BACKOFF_MULTIPLIER") {
            self.retry.backoff_multiplier = v;
        }
        if let Some(v) = env_parse::<usize>("CHAT_SEARCH_TOP_K") {
            self.tools.top_k_results = v;
        }
        if let Some(v) = env_parse::<usize>("CHAT_SEARCH_DOC_CHARS_MAX") {
            self.tools.doc_content_chars_max = v;
        }
        self.http.apply_env_overrides();
    }

    pub fn validate(&self) -> Result<()> {
        self.retry.validate()?;

        if self.tools.top_k_results == 0 {
            return Err(Error::configuration_with_context(
                "top_k_results must be at least 1",
                ErrorContext::new()
                    .with_field_path("tools.top_k_results")
                    .with_source("config_loader"),
            ));
        }

        for (field, value) in [
            ("endpoints.wikipedia", &self.endpoints.wikipedia),
            ("endpoints.arxiv", &self.endpoints.arxiv),
            ("endpoints.duckduckgo", &self.endpoints.duckduckgo),
        ] {
            let parsed = url::Url::parse(value).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid endpoint URL: {}", e),
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_details(value.clone())
                        .with_source("config_loader"),
                )
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::configuration_with_context(
                    "endpoint URL must use http or https",
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_details(value.clone())
                        .with_source("config_loader"),
                ));
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}
