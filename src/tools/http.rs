use super::ToolError;
use reqwest::{Proxy, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// HTTP client knobs shared by all lookup tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub proxy_url: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("chat-search/{}", env!("CARGO_PKG_VERSION")),
            proxy_url: None,
        }
    }
}

impl HttpSettings {
    /// Defaults with `CHAT_SEARCH_HTTP_TIMEOUT_SECS` / `CHAT_SEARCH_PROXY_URL` applied.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(secs) = env::var("CHAT_SEARCH_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.timeout_secs = secs;
        }
        if let Ok(proxy_url) = env::var("CHAT_SEARCH_PROXY_URL") {
            self.proxy_url = Some(proxy_url);
        }
    }
}

/// Thin wrapper over a pooled `reqwest::Client`, cheap to clone.
#[derive(Debug, Clone)]
pub struct SearchHttpClient {
    client: reqwest::Client,
}

impl SearchHttpClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, ToolError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(settings.user_agent.clone())
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = settings.proxy_url.as_deref() {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!("ignoring invalid proxy url {}: {}", proxy_url, e),
            }
        }

        Ok(Self {
            client: builder.build().map_err(transport)?,
        })
    }

    /// GET `url` with query parameters and return the body of a 2xx response.
    ///
    /// 429 maps to [`ToolError::RateLimited`]; any other non-2xx status maps to
    /// [`ToolError::Status`].
    pub(crate) async fn get_text(
        &self,
        provider: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<(StatusCode, String), ToolError> {
        tracing::debug!(provider, url, "sending lookup request");
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ToolError::RateLimited {
                provider: provider.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            let message = status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string();
            return Err(ToolError::Status {
                provider: provider.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(transport)?;
        Ok((status, body))
    }

    /// Like [`get_text`](Self::get_text), decoding the body as JSON.
    pub(crate) async fn get_json(
        &self,
        provider: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<(StatusCode, serde_json::Value), ToolError> {
        let (status, body) = self.get_text(provider, url, params).await?;
        let value = serde_json::from_str(&body).map_err(|e| ToolError::Parse {
            provider: provider.to_string(),
            message: e.to_string(),
        })?;
        Ok((status, value))
    }
}

/// The request URL carries the user's query, which must not leak into the
/// error text the invoker classifies.
fn transport(err: reqwest::Error) -> ToolError {
    ToolError::Http(err.without_url())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = HttpSettings::default();
        assert_eq!(s.timeout_secs, 30);
        assert!(s.user_agent.starts_with("chat-search/"));
        assert!(s.proxy_url.is_none());
    }

    #[test]
    fn test_client_builds_with_bad_proxy() {
        let settings = HttpSettings {
            proxy_url: Some("::not a url::".into()),
            ..Default::default()
        };
        assert!(SearchHttpClient::new(&settings).is_ok());
    }
}
