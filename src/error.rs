use crate::tools::ToolError;
use thiserror::Error;

/// Structured error context for configuration and validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "retry.max_attempts")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "research_session")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for cached lookups.
///
/// Tool failures that are not rate limits pass through [`Error::Tool`] untouched,
/// so their text and variant are exactly what the tool produced.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Rate limit exceeded. Please try again later. (query: {query:?}, attempts: {attempts})")]
    RetryExhausted { query: String, attempts: u32 },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// True when every attempt was rate limited and the caller should try later.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, Error::RetryExhausted { .. })
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_errors_keep_their_text() {
        let err: Error = ToolError::Failed("connection reset by peer".into()).into();
        assert_eq!(err.to_string(), "connection reset by peer");
        assert!(!err.is_retry_exhausted());
    }

    #[test]
    fn retry_exhausted_mentions_query_and_attempts() {
        let err = Error::RetryExhausted {
            query: "rust ownership".into(),
            attempts: 5,
        };
        let text = err.to_string();
        assert!(text.starts_with("Rate limit exceeded. Please try again later."));
        assert!(text.contains("\"rust ownership\""));
        assert!(text.contains("attempts: 5"));
        assert!(err.is_retry_exhausted());
    }

    #[test]
    fn context_is_rendered() {
        let err = Error::configuration_with_context(
            "max_attempts must be at least 1",
            ErrorContext::new()
                .with_field_path("retry.max_attempts")
                .with_source("config_loader"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: max_attempts must be at least 1 (field: retry.max_attempts, source: config_loader)"
        );
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("retry.max_attempts")
        );
    }
}
