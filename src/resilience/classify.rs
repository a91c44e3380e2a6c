//! Failure classification for tool errors.

/// How the invoker treats a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Back off and try again.
    RateLimited,
    /// Propagate to the caller on first occurrence.
    NonRetryable,
}

/// Substring that marks a rate-limit failure, matched case-insensitively.
pub const RATE_LIMIT_MARKER: &str = "ratelimit";

/// Classify an error by its display text.
///
/// The rule is literal: the lowercased text must contain
/// `"ratelimit"`. "Rate Limit" (with a space) or a bare "HTTP 429" does not
/// match.
pub fn classify_failure<E: std::fmt::Display + ?Sized>(error: &E) -> FailureClass {
    if is_rate_limit_text(&error.to_string()) {
        FailureClass::RateLimited
    } else {
        FailureClass::NonRetryable
    }
}

pub fn is_rate_limit_text(text: &str) -> bool {
    text.to_lowercase().contains(RATE_LIMIT_MARKER)
}
