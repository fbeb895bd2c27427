//! Scripted provider adapters for integration testing.
//!
//! Each adapter pops one scripted outcome per call and records every prompt
//! it receives, so tests can assert call counts, ordering, and prompt
//! identity across fallback hops.

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{GenerateOptions, ProviderAdapter, ProviderReply, RelayError, RelayResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A provider adapter driven by a fixed script of outcomes.
pub struct ScriptedAdapter {
    id: String,
    model: String,
    endpoint: Option<String>,
    available: bool,
    credentialed: bool,
    script: Mutex<VecDeque<RelayResult<ProviderReply>>>,
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAdapter {
    /// Create a builder for an adapter with the given id.
    pub fn builder(id: impl Into<String>) -> ScriptedAdapterBuilder {
        ScriptedAdapterBuilder {
            id: id.into(),
            model: "mock-model".to_string(),
            endpoint: None,
            available: true,
            credentialed: false,
            script: Vec::new(),
        }
    }

    /// Adapter that answers every call with `text`.
    pub fn always_ok(id: impl Into<String>, text: impl Into<String>) -> Arc<Self> {
        let text = text.into();
        Self::builder(id).then_ok(&text).build()
    }

    /// Adapter that fails every call with a clone of `error`.
    pub fn always_err(id: impl Into<String>, error: RelayError) -> Arc<Self> {
        Self::builder(id).then_err(error).build()
    }

    /// Number of `generate` calls received.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn has_credentials(&self) -> bool {
        self.credentialed
    }

    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> RelayResult<ProviderReply> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        let mut script = self.script.lock();
        match script.pop_front() {
            Some(outcome) => {
                // The final script entry repeats for any further calls.
                if script.is_empty() {
                    script.push_back(clone_outcome(&outcome));
                }
                outcome
            }
            None => Ok(ProviderReply::new("unscripted")),
        }
    }
}

fn clone_outcome(outcome: &RelayResult<ProviderReply>) -> RelayResult<ProviderReply> {
    match outcome {
        Ok(reply) => Ok(reply.clone()),
        Err(err) => Err(err.clone()),
    }
}

/// Builder for [`ScriptedAdapter`].
pub struct ScriptedAdapterBuilder {
    id: String,
    model: String,
    endpoint: Option<String>,
    available: bool,
    credentialed: bool,
    script: Vec<RelayResult<ProviderReply>>,
}

impl ScriptedAdapterBuilder {
    /// Set the model id the adapter reports.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Give the adapter an outbound endpoint subject to pre-flight checks.
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Mark the adapter unavailable.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Mark credentials as configured.
    #[must_use]
    pub fn credentialed(mut self) -> Self {
        self.credentialed = true;
        self
    }

    /// Script a successful reply.
    #[must_use]
    pub fn then_ok(mut self, text: &str) -> Self {
        self.script.push(Ok(ProviderReply::new(text)));
        self
    }

    /// Script a successful reply with token usage.
    #[must_use]
    pub fn then_reply(mut self, reply: ProviderReply) -> Self {
        self.script.push(Ok(reply));
        self
    }

    /// Script a failure.
    #[must_use]
    pub fn then_err(mut self, error: RelayError) -> Self {
        self.script.push(Err(error));
        self
    }

    /// Script an upstream 429.
    #[must_use]
    pub fn then_rate_limited(self) -> Self {
        self.then_err(RelayError::provider("429", "rate limit exceeded"))
    }

    /// Script a timeout.
    #[must_use]
    pub fn then_timeout(self) -> Self {
        self.then_err(RelayError::timeout(Duration::from_secs(30)))
    }

    /// Script a terminal policy block.
    #[must_use]
    pub fn then_policy_block(self, category: &str) -> Self {
        self.then_err(RelayError::ai_response(category, "blocked by provider policy"))
    }

    /// Finish the adapter.
    pub fn build(self) -> Arc<ScriptedAdapter> {
        Arc::new(ScriptedAdapter {
            id: self.id,
            model: self.model,
            endpoint: self.endpoint,
            available: self.available,
            credentialed: self.credentialed,
            script: Mutex::new(self.script.into()),
            call_count: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }
}
