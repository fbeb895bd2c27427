//! The fallback orchestrator: drives the ordered attempt sequence across
//! providers for one logical request.
//!
//! Attempts are strictly sequential: concurrent speculative calls to
//! multiple paid providers are out of scope, and sequential order is what
//! makes the terminal-stop rule well-defined. The orchestrator is the sole
//! decision point for retry-vs-stop; adapters classify and raise, nothing
//! more.

use crate::diagnostics::ErrorSummary;
use parking_lot::Mutex;
use relay_config::OrchestratorSettings;
use relay_core::{
    GenerateOptions, GenerationMeta, GenerationRequest, ProviderAdapter, RelayError, RelayResponse,
};
use relay_safety::SafetyPipeline;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives the ordered provider fallback chain.
pub struct FallbackOrchestrator {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
    safety: Arc<SafetyPipeline>,
    settings: OrchestratorSettings,
    recent_errors: Mutex<VecDeque<ErrorSummary>>,
}

impl FallbackOrchestrator {
    /// Create an orchestrator over the given safety pipeline.
    #[must_use]
    pub fn new(settings: OrchestratorSettings, safety: Arc<SafetyPipeline>) -> Self {
        Self {
            adapters: HashMap::new(),
            safety,
            settings,
            recent_errors: Mutex::new(VecDeque::new()),
        }
    }

    /// Register a provider adapter under its own id.
    pub fn register_adapter(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.id().to_string(), adapter);
    }

    /// Registered adapters, for the diagnostics surface.
    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn ProviderAdapter>> {
        self.adapters.values()
    }

    /// Run a request through its fallback chain.
    pub async fn run(&self, request: &GenerationRequest) -> RelayResponse {
        self.run_cancellable(request, &CancellationToken::new())
            .await
    }

    /// Run a request, aborting the in-flight attempt when `cancel` fires.
    ///
    /// Cancellation does not advance the chain; the attempts made so far
    /// remain in the returned metadata for diagnostics.
    pub async fn run_cancellable(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> RelayResponse {
        let started = Instant::now();
        let mut meta = GenerationMeta::new(request.mode, request.request_id.clone());
        let timeout = request
            .timeout_secs
            .map_or(self.settings.request_timeout, Duration::from_secs);
        let options = GenerateOptions::default().with_timeout(timeout);

        let mut last_error: Option<RelayError> = None;

        for (position, provider_id) in request.provider_chain.iter().enumerate() {
            if cancel.is_cancelled() {
                return self.cancelled(request, meta, started);
            }

            let Some(adapter) = self.adapters.get(provider_id) else {
                warn!(
                    request_id = %meta.request_id,
                    provider = %provider_id,
                    "provider in chain is not registered, skipping"
                );
                last_error = Some(RelayError::provider(
                    "unknown",
                    format!("provider {provider_id} is not registered"),
                ));
                continue;
            };

            // Pre-flight safety screening for adapters that fetch outbound.
            // Denials are security events, not attempts: the adapter is
            // never reached, so nothing lands in provider_attempts.
            if let Some(endpoint) = adapter.endpoint() {
                let decision = self.safety.screen_url(endpoint);
                if !decision.allowed {
                    warn!(
                        request_id = %meta.request_id,
                        provider = %provider_id,
                        reason = decision.reason.as_deref().unwrap_or("denied"),
                        "provider endpoint denied pre-flight, skipping"
                    );
                    last_error = Some(RelayError::provider(
                        "blocked",
                        format!(
                            "provider {provider_id} denied before invocation: {}",
                            decision.reason.as_deref().unwrap_or("safety policy")
                        ),
                    ));
                    continue;
                }
            }

            meta.record_attempt(provider_id.clone());
            debug!(
                request_id = %meta.request_id,
                provider = %provider_id,
                attempt = meta.provider_attempts.len(),
                "invoking provider"
            );

            // The prompt is borrowed from the request: every adapter in the
            // chain sees the same bytes.
            let attempt = tokio::time::timeout(timeout, adapter.generate(&request.prompt, &options));
            let outcome = tokio::select! {
                () = cancel.cancelled() => {
                    return self.cancelled(request, meta, started);
                }
                result = attempt => match result {
                    Ok(inner) => inner,
                    Err(_) => Err(RelayError::timeout(timeout)),
                },
            };

            match outcome {
                Ok(reply) => {
                    let clean = self.safety.clean_model_output(&reply.text);
                    meta.record_usage(reply.tokens_in, reply.tokens_out);
                    meta.cost_usd_est = reply.cost_usd_est;
                    meta.tools_used = reply.tools_used;
                    meta.tool_result_count = reply.tool_result_count;
                    meta.cache_hit = reply.cache_hit;
                    meta.complete_success(
                        provider_id.clone(),
                        adapter.model(),
                        elapsed_ms(started),
                    );
                    info!(
                        request_id = %meta.request_id,
                        provider = %provider_id,
                        latency_ms = meta.latency_ms,
                        fallback_used = meta.fallback_used,
                        "generation succeeded"
                    );
                    return RelayResponse::success(clean, meta);
                }
                Err(error) => {
                    self.record_error(provider_id, &error);

                    if error.is_terminal() {
                        // A policy block stops the chain; remaining
                        // providers are never consulted.
                        warn!(
                            request_id = %meta.request_id,
                            provider = %provider_id,
                            error = %error,
                            "terminal policy block, stopping fallback chain"
                        );
                        meta.complete_failure(&error, elapsed_ms(started));
                        return RelayResponse::failure(meta);
                    }

                    warn!(
                        request_id = %meta.request_id,
                        provider = %provider_id,
                        error = %error,
                        "provider attempt failed, advancing chain"
                    );

                    let rate_limited = error.is_rate_limited();
                    last_error = Some(error);

                    if rate_limited && position + 1 < request.provider_chain.len() {
                        tokio::time::sleep(self.settings.attempt_backoff).await;
                    }
                }
            }
        }

        let error = last_error.unwrap_or_else(|| {
            RelayError::provider("unknown", "provider chain was empty")
        });
        meta.complete_failure(&error, elapsed_ms(started));
        warn!(
            request_id = %meta.request_id,
            attempts = meta.provider_attempts.len(),
            category = %error.category(),
            "fallback chain exhausted"
        );
        RelayResponse::failure(meta)
    }

    /// Finalize a cancelled request. Cancellation classifies as `Timeout`
    /// and never advances to the next chain entry.
    fn cancelled(
        &self,
        request: &GenerationRequest,
        mut meta: GenerationMeta,
        started: Instant,
    ) -> RelayResponse {
        let error = RelayError::timeout(started.elapsed());
        info!(
            request_id = %meta.request_id,
            attempts = meta.provider_attempts.len(),
            "request cancelled by caller"
        );
        if let Some(current) = meta.provider_attempts.last() {
            self.record_error(current, &error);
        } else if let Some(first) = request.provider_chain.first() {
            self.record_error(first, &error);
        }
        meta.complete_failure(&error, elapsed_ms(started));
        RelayResponse::failure(meta)
    }

    fn record_error(&self, provider: &str, error: &RelayError) {
        let mut errors = self.recent_errors.lock();
        while errors.len() >= self.settings.max_recent_errors.max(1) {
            errors.pop_front();
        }
        errors.push_back(ErrorSummary::from_error(provider, error));
    }

    /// Recent redacted error summaries, newest first.
    #[must_use]
    pub fn recent_errors(&self, limit: usize) -> Vec<ErrorSummary> {
        let errors = self.recent_errors.lock();
        errors.iter().rev().take(limit).cloned().collect()
    }

    /// The safety pipeline backing this orchestrator.
    #[must_use]
    pub fn safety(&self) -> &Arc<SafetyPipeline> {
        &self.safety
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
