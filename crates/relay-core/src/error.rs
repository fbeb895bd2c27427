//! Error taxonomy shared by all provider adapters and the orchestrator.
//!
//! The taxonomy is closed: every upstream failure mode maps into exactly one
//! of four kinds, and the orchestrator reasons about nothing else. Adapters
//! must never return raw error strings or smuggle a failure through a
//! successful empty response.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result type for relay operations.
pub type RelayResult<T> = std::result::Result<T, RelayError>;

/// The closed failure taxonomy.
///
/// `Timeout`, `Provider` and `Network` are retryable: the fallback chain may
/// advance to the next provider. `AiResponse` is terminal: the upstream model
/// refused the request (policy or safety block) and the chain must stop.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RelayError {
    /// The provider call did not complete within the allotted time.
    #[error("provider call timed out after {timeout:?}")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The provider reported an infrastructure-level failure.
    #[error("provider error (code {code}): {message}")]
    Provider {
        /// Upstream status or code string, e.g. `"429"`, `"503"`, `"unknown"`.
        code: String,
        /// Human-readable description of the failure.
        message: String,
    },

    /// The upstream model refused the request (policy/safety block).
    ///
    /// The category is informational; the kind itself is what makes the
    /// failure terminal.
    #[error("response blocked by provider policy ({category}): {message}")]
    AiResponse {
        /// Provider-reported violation category.
        category: String,
        /// Human-readable description of the block.
        message: String,
    },

    /// A connection-level failure before any response was received.
    #[error("network failure: {message}")]
    Network {
        /// Human-readable description of the failure.
        message: String,
    },
}

impl RelayError {
    /// Create a timeout error.
    #[must_use]
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Create a provider error with a code string.
    pub fn provider(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a terminal policy-block error.
    pub fn ai_response(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AiResponse {
            category: category.into(),
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Map an HTTP failure status to a taxonomy kind.
    ///
    /// Callers must run their policy predicate *before* this mapping: a 400
    /// payload can be either a malformed request or a genuine policy block,
    /// and only the payload distinguishes them.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            400..=599 => Self::provider(status.to_string(), message),
            _ => Self::provider("unknown", message),
        }
    }

    /// Whether the fallback chain may advance past this failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether this failure must stop the fallback chain.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AiResponse { .. })
    }

    /// Whether this is a rate-limit rejection from the upstream vendor.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Provider { code, .. } if code == "429")
    }

    /// The taxonomy label recorded into generation metadata.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Provider { .. } => ErrorCategory::ProviderError,
            Self::AiResponse { .. } => ErrorCategory::AiResponseError,
            Self::Network { .. } => ErrorCategory::NetworkError,
        }
    }
}

/// Serialized taxonomy label attached to failed generation metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The call timed out or was cancelled.
    Timeout,
    /// Retryable upstream infrastructure failure.
    ProviderError,
    /// Terminal policy/safety block.
    AiResponseError,
    /// Connection-level failure.
    NetworkError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ProviderError => write!(f, "provider_error"),
            Self::AiResponseError => write!(f, "ai_response_error"),
            Self::NetworkError => write!(f, "network_error"),
        }
    }
}
