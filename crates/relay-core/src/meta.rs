//! Generation metadata: the structured record of how a response was produced.
//!
//! One `GenerationMeta` exists per logical request. The orchestrator creates
//! it at request start, appends to it as attempts complete, and freezes it by
//! returning it by value with the final result. Nothing mutates it after it
//! has been handed to a caller.

use crate::error::{ErrorCategory, RelayError};
use crate::request::ExecutionMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured record of how a response was produced, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMeta {
    /// Winning (or final attempted) provider id.
    pub provider: String,
    /// Model served by the winning provider.
    pub model: String,
    /// Execution mode of the request.
    pub mode: ExecutionMode,
    /// Wall-clock latency of the whole request in milliseconds.
    pub latency_ms: u64,
    /// When the request started.
    pub timestamp: DateTime<Utc>,
    /// Prompt tokens consumed, when the provider reports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u64>,
    /// Completion tokens produced, when the provider reports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u64>,
    /// Total tokens, when derivable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_total: Option<u64>,
    /// Estimated cost in USD, when derivable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd_est: Option<f64>,
    /// Tool identifiers in invocation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
    /// Number of tool results folded into the response.
    pub tool_result_count: u32,
    /// Whether the response was served from a cache.
    pub cache_hit: bool,
    /// Opaque unique id for this request.
    pub request_id: String,
    /// Provider ids actually tried, in attempt order. Append-only.
    pub provider_attempts: Vec<String>,
    /// True iff more than one provider was tried.
    pub fallback_used: bool,
    /// Whether the request succeeded.
    pub success: bool,
    /// Human-readable failure message. Present iff the request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Taxonomy kind of the failure. Present iff the request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
}

impl GenerationMeta {
    /// Create an empty record at request start.
    ///
    /// A fresh v4 UUID is assigned when `request_id` is `None`.
    #[must_use]
    pub fn new(mode: ExecutionMode, request_id: Option<String>) -> Self {
        Self {
            provider: String::new(),
            model: String::new(),
            mode,
            latency_ms: 0,
            timestamp: Utc::now(),
            tokens_in: None,
            tokens_out: None,
            tokens_total: None,
            cost_usd_est: None,
            tools_used: Vec::new(),
            tool_result_count: 0,
            cache_hit: false,
            request_id: request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            provider_attempts: Vec::new(),
            fallback_used: false,
            success: false,
            error: None,
            error_category: None,
        }
    }

    /// Record that an attempt against `provider_id` is starting.
    ///
    /// Called before the adapter is invoked so a crash mid-attempt still
    /// shows in the record.
    pub fn record_attempt(&mut self, provider_id: impl Into<String>) {
        self.provider_attempts.push(provider_id.into());
    }

    /// Finalize as a success for the given provider and model.
    ///
    /// Clears any error fields and derives `fallback_used` from the attempt
    /// count, upholding the success invariant.
    pub fn complete_success(
        &mut self,
        provider: impl Into<String>,
        model: impl Into<String>,
        latency_ms: u64,
    ) {
        self.provider = provider.into();
        self.model = model.into();
        self.latency_ms = latency_ms;
        self.success = true;
        self.error = None;
        self.error_category = None;
        self.fallback_used = self.provider_attempts.len() > 1;
    }

    /// Finalize as a failure classified from `error`.
    pub fn complete_failure(&mut self, error: &RelayError, latency_ms: u64) {
        if let Some(last) = self.provider_attempts.last() {
            self.provider = last.clone();
        }
        self.latency_ms = latency_ms;
        self.success = false;
        self.error = Some(error.to_string());
        self.error_category = Some(error.category());
        self.fallback_used = self.provider_attempts.len() > 1;
    }

    /// Record token usage reported by the winning provider.
    pub fn record_usage(&mut self, tokens_in: Option<u64>, tokens_out: Option<u64>) {
        self.tokens_in = tokens_in;
        self.tokens_out = tokens_out;
        self.tokens_total = match (tokens_in, tokens_out) {
            (Some(i), Some(o)) => Some(i + o),
            (Some(t), None) | (None, Some(t)) => Some(t),
            (None, None) => None,
        };
    }

    /// Record a tool invocation in order.
    pub fn record_tool(&mut self, tool_id: impl Into<String>) {
        self.tools_used.push(tool_id.into());
    }

    /// Check the success/error field invariant.
    ///
    /// Success implies no error fields; failure implies both are set.
    /// `fallback_used` must agree with the attempt count.
    #[must_use]
    pub fn invariant_holds(&self) -> bool {
        let errors_consistent = if self.success {
            self.error.is_none() && self.error_category.is_none()
        } else {
            self.error.is_some() && self.error_category.is_some()
        };
        errors_consistent && self.fallback_used == (self.provider_attempts.len() > 1)
    }
}
