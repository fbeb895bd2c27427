//! # Relay Gateway
//!
//! The dependency-injected facade over the relay: builds the safety
//! pipeline and fallback orchestrator from configuration and registered
//! adapters, and exposes the generation and diagnostics surfaces.
//!
//! Every component is constructed explicitly and passed down. There is no
//! ambient global state, so independent `Relay` instances (and tests) never
//! interfere with each other.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diagnostics;

pub use diagnostics::{DiagnosticsSnapshot, ProviderDiagnostics};

use chrono::Utc;
use relay_config::RelayConfig;
use relay_core::{GenerationRequest, ProviderAdapter, RelayResponse};
use relay_orchestrator::FallbackOrchestrator;
use relay_safety::{SafetyError, SafetyPipeline, SecurityEvent, SecurityLogger};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Error raised while assembling a [`Relay`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The safety pipeline could not be constructed.
    #[error("safety pipeline: {0}")]
    Safety(#[from] SafetyError),

    /// No adapters were registered.
    #[error("at least one provider adapter must be registered")]
    NoAdapters,
}

/// The assembled gateway.
pub struct Relay {
    orchestrator: FallbackOrchestrator,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay").finish_non_exhaustive()
    }
}

impl Relay {
    /// Start building a relay.
    #[must_use]
    pub fn builder() -> RelayBuilder {
        RelayBuilder::new()
    }

    /// Run a generation request through its fallback chain.
    ///
    /// The response always carries metadata, success or failure; a failed
    /// request never fabricates response text.
    pub async fn generate(&self, request: &GenerationRequest) -> RelayResponse {
        self.orchestrator.run(request).await
    }

    /// Run a generation request that the caller may cancel.
    ///
    /// Cancellation aborts the in-flight provider attempt without advancing
    /// the chain; partial attempt metadata is preserved in the response.
    pub async fn generate_cancellable(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> RelayResponse {
        self.orchestrator.run_cancellable(request, cancel).await
    }

    /// Read-only diagnostics snapshot for operational tooling.
    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        let mut providers: Vec<ProviderDiagnostics> = self
            .orchestrator
            .adapters()
            .map(|adapter| ProviderDiagnostics {
                id: adapter.id().to_string(),
                model: adapter.model().to_string(),
                available: adapter.is_available(),
                credentials_configured: adapter.has_credentials(),
            })
            .collect();
        providers.sort_by(|a, b| a.id.cmp(&b.id));

        DiagnosticsSnapshot {
            generated_at: Utc::now(),
            providers,
            recent_errors: self.orchestrator.recent_errors(20),
        }
    }

    /// Recent safety events from the audit trail, newest first.
    #[must_use]
    pub fn security_events(&self, limit: usize) -> Vec<SecurityEvent> {
        self.security_logger().recent_events(limit)
    }

    /// The shared security logger.
    #[must_use]
    pub fn security_logger(&self) -> &Arc<SecurityLogger> {
        self.orchestrator.safety().logger()
    }

    /// The safety pipeline, for direct content cleaning.
    #[must_use]
    pub fn safety(&self) -> &Arc<SafetyPipeline> {
        self.orchestrator.safety()
    }
}

/// Builder assembling a [`Relay`] from configuration and adapters.
pub struct RelayBuilder {
    config: RelayConfig,
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl RelayBuilder {
    fn new() -> Self {
        Self {
            config: RelayConfig::default(),
            adapters: Vec::new(),
        }
    }

    /// Use the given configuration instead of defaults.
    #[must_use]
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a provider adapter.
    #[must_use]
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Assemble the relay.
    ///
    /// # Errors
    /// Fails when the configuration is invalid, the safety pipeline cannot
    /// be built, or no adapters were registered.
    pub fn build(self) -> Result<Relay, BuildError> {
        self.config.check().map_err(BuildError::Config)?;
        if self.adapters.is_empty() {
            return Err(BuildError::NoAdapters);
        }

        let safety = Arc::new(SafetyPipeline::new(&self.config)?);
        let mut orchestrator =
            FallbackOrchestrator::new(self.config.orchestrator.clone(), safety);
        for adapter in self.adapters {
            orchestrator.register_adapter(adapter);
        }

        Ok(Relay { orchestrator })
    }
}

impl Default for RelayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize process-wide tracing with an env-filter.
///
/// `RUST_LOG` wins when set; `default_level` applies otherwise. Safe to call
/// once per process; subsequent calls are ignored.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .try_init();
}
