//! Provider adapter contract.
//!
//! An adapter wraps one upstream LLM API. The contract is strict: `generate`
//! either returns a reply or fails with exactly one taxonomy kind. Retries
//! are exclusively the orchestrator's responsibility: an adapter reports a
//! failure on first occurrence and never loops internally.

use crate::error::RelayResult;
use async_trait::async_trait;
use secrecy::SecretString;
use std::time::Duration;

/// Options passed to an adapter for a single generation call.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Timeout the orchestrator enforces around the call. Adapters should
    /// also pass it to their HTTP client so the connection is torn down.
    pub timeout: Duration,
    /// Maximum completion tokens, when the caller bounds output.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_tokens: None,
            temperature: None,
        }
    }
}

impl GenerateOptions {
    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the completion-token cap.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A successful reply from a provider adapter.
#[derive(Debug, Clone, Default)]
pub struct ProviderReply {
    /// The generated text.
    pub text: String,
    /// Prompt tokens consumed, when the provider reports usage.
    pub tokens_in: Option<u64>,
    /// Completion tokens produced, when the provider reports usage.
    pub tokens_out: Option<u64>,
    /// Estimated cost in USD, when the adapter can derive it.
    pub cost_usd_est: Option<f64>,
    /// Tool identifiers invoked while producing the reply, in order.
    pub tools_used: Vec<String>,
    /// Number of tool results folded into the reply.
    pub tool_result_count: u32,
    /// Whether the reply was served from a provider-side cache.
    pub cache_hit: bool,
}

impl ProviderReply {
    /// Create a reply carrying only text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Attach token usage.
    #[must_use]
    pub fn with_usage(mut self, tokens_in: u64, tokens_out: u64) -> Self {
        self.tokens_in = Some(tokens_in);
        self.tokens_out = Some(tokens_out);
        self
    }

    /// Attach a cost estimate.
    #[must_use]
    pub fn with_cost(mut self, usd: f64) -> Self {
        self.cost_usd_est = Some(usd);
        self
    }

    /// Record a tool invocation.
    #[must_use]
    pub fn with_tool(mut self, tool_id: impl Into<String>) -> Self {
        self.tools_used.push(tool_id.into());
        self.tool_result_count += 1;
        self
    }
}

/// Contract implemented by every provider adapter.
///
/// Implementations map every upstream failure mode into exactly one
/// [`crate::RelayError`] kind. Never a bare string, never a silently
/// swallowed error returned as an empty success.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable identifier used in fallback chains and metadata.
    fn id(&self) -> &str;

    /// Model identifier this adapter serves.
    fn model(&self) -> &str;

    /// Outbound endpoint URL, when the adapter issues network fetches.
    ///
    /// The orchestrator screens this through the safety pipeline before the
    /// adapter is invoked. Adapters without an outbound fetch return `None`.
    fn endpoint(&self) -> Option<&str> {
        None
    }

    /// Whether the adapter is currently usable (configured and not disabled).
    fn is_available(&self) -> bool {
        true
    }

    /// Whether credentials are configured. Diagnostics report presence only.
    fn has_credentials(&self) -> bool {
        false
    }

    /// Generate text for the prompt.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> RelayResult<ProviderReply>;
}

/// Credential holder for adapter implementations.
///
/// Wraps the secret so it never lands in debug output or serialized
/// diagnostics; only its presence is observable.
#[derive(Clone)]
pub struct AdapterCredentials {
    api_key: Option<SecretString>,
}

impl AdapterCredentials {
    /// No credentials configured.
    #[must_use]
    pub fn none() -> Self {
        Self { api_key: None }
    }

    /// Wrap an API key.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::new(key.into())),
        }
    }

    /// Whether a key is present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Expose the key for request signing. Callers must not log it.
    #[must_use]
    pub fn expose(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }
}

impl std::fmt::Debug for AdapterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterCredentials")
            .field("configured", &self.is_configured())
            .finish()
    }
}
