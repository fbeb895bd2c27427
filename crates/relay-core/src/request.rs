//! Generation request and response types.

use crate::meta::GenerationMeta;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Execution mode tag carried by a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Single-shot answer from one provider.
    Direct,
    /// Answer assembled with web research.
    Research,
    /// Code-producing request.
    CodeGeneration,
    /// Multi-part composition.
    Composition,
    /// Hierarchical decomposition.
    Hierarchical,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Research => write!(f, "research"),
            Self::CodeGeneration => write!(f, "code_generation"),
            Self::Composition => write!(f, "composition"),
            Self::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

/// One logical generation request submitted to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The prompt text. Passed byte-identical to every provider in the chain.
    pub prompt: String,
    /// Ordered fallback chain of provider ids.
    pub provider_chain: Vec<String>,
    /// Execution mode tag.
    pub mode: ExecutionMode,
    /// Optional caller-assigned request id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Per-call timeout override in seconds; the configured default applies
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl GenerationRequest {
    /// Create a request with the given prompt and chain, `Direct` mode.
    pub fn new(prompt: impl Into<String>, provider_chain: Vec<String>) -> Self {
        Self {
            prompt: prompt.into(),
            provider_chain,
            mode: ExecutionMode::Direct,
            request_id: None,
            timeout_secs: None,
        }
    }

    /// Set the execution mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set an explicit request id.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Set a per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }
}

/// The response returned for every generation request, success or failure.
///
/// `meta` is always present; `response` is `Some` iff `success` is true. A
/// failed request never fabricates response text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayResponse {
    /// Whether the request produced a response.
    pub success: bool,
    /// The sanitized response text, when successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// How the response was produced.
    pub meta: GenerationMeta,
}

impl RelayResponse {
    /// Build a successful response.
    #[must_use]
    pub fn success(text: String, meta: GenerationMeta) -> Self {
        Self {
            success: true,
            response: Some(text),
            meta,
        }
    }

    /// Build a failed response. The failure detail lives in `meta`.
    #[must_use]
    pub fn failure(meta: GenerationMeta) -> Self {
        Self {
            success: false,
            response: None,
            meta,
        }
    }
}
