//! Redacted error summaries for the diagnostics surface.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use relay_core::{ErrorCategory, RelayError};
use serde::Serialize;

/// Cap on summary message length.
const MAX_MESSAGE_LEN: usize = 200;

/// Credential-shaped substrings that must never reach operational tooling.
static SECRET_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:sk|pk|rk)-[A-Za-z0-9_-]{8,}|\bbearer\s+\S+|\b(?:api[_-]?key|token|authorization)\s*[=:]\s*(?:bearer\s+)?\S+",
    )
    .unwrap()
});

/// One redacted entry in the recent-error feed.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummary {
    /// When the failure happened.
    pub timestamp: DateTime<Utc>,
    /// Provider that failed.
    pub provider: String,
    /// Taxonomy kind of the failure.
    pub category: ErrorCategory,
    /// Redacted, truncated description.
    pub message: String,
}

impl ErrorSummary {
    /// Build a summary from a classified failure.
    #[must_use]
    pub fn from_error(provider: &str, error: &RelayError) -> Self {
        Self {
            timestamp: Utc::now(),
            provider: provider.to_string(),
            category: error.category(),
            message: redact(&error.to_string()),
        }
    }
}

/// Strip credential-shaped substrings and truncate.
fn redact(message: &str) -> String {
    let cleaned = SECRET_TOKENS.replace_all(message, "[REDACTED]");
    let mut out = cleaned.into_owned();
    if out.len() > MAX_MESSAGE_LEN {
        let mut end = MAX_MESSAGE_LEN;
        while !out.is_char_boundary(end) {
            end -= 1;
        }
        out.truncate(end);
        out.push('…');
    }
    out
}
