//! Composed safety pipeline: URL validation, domain policy, rate limiting,
//! and content cleaning behind one seam.
//!
//! Availability is prioritized over the safety layer's own robustness: when
//! a component fails internally (as opposed to denying), the pipeline fails
//! OPEN: the request proceeds and a critical security event records the
//! gap so it is visible to operators.

use crate::audit::{SecurityEventType, SecurityLogger, Severity};
use crate::error::SafetyResult;
use crate::guard::ConnectionGuard;
use crate::rate_limit::RateLimiter;
use crate::sanitize::ContentSanitizer;
use relay_config::RelayConfig;
use std::sync::Arc;
use tracing::error;

/// Stage at which a URL was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenStage {
    /// Lexical URL validation (scheme, extension, SSRF literal).
    UrlValidation,
    /// Domain allow/deny policy.
    DomainPolicy,
    /// Per-domain rate limiting.
    RateLimit,
}

/// Outcome of screening an outbound URL.
#[derive(Debug, Clone)]
pub struct ScreenDecision {
    /// Whether the fetch may proceed.
    pub allowed: bool,
    /// The stage that denied it, when denied.
    pub stage: Option<ScreenStage>,
    /// Why it was denied.
    pub reason: Option<String>,
    /// Seconds until a retry can succeed, for rate-limit denials.
    pub wait_secs: Option<u64>,
}

impl ScreenDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            stage: None,
            reason: None,
            wait_secs: None,
        }
    }

    fn deny(stage: ScreenStage, reason: Option<String>, wait_secs: Option<u64>) -> Self {
        Self {
            allowed: false,
            stage: Some(stage),
            reason,
            wait_secs,
        }
    }
}

/// The composed safety layer handed to the orchestrator.
pub struct SafetyPipeline {
    sanitizer: ContentSanitizer,
    guard: ConnectionGuard,
    limiter: RateLimiter,
    logger: Arc<SecurityLogger>,
}

impl SafetyPipeline {
    /// Build the full pipeline from configuration.
    ///
    /// # Errors
    /// Returns an error when the sanitizer's configured patterns are invalid.
    pub fn new(config: &RelayConfig) -> SafetyResult<Self> {
        let logger = Arc::new(SecurityLogger::new(&config.audit));
        Ok(Self {
            sanitizer: ContentSanitizer::new(&config.sanitizer)?,
            guard: ConnectionGuard::new(&config.guard, Arc::clone(&logger)),
            limiter: RateLimiter::new(config.rate_limit.clone()),
            logger,
        })
    }

    /// Build a pipeline with all-default settings.
    ///
    /// # Errors
    /// Propagates sanitizer construction failures (not reachable with the
    /// shipped defaults).
    pub fn with_defaults() -> SafetyResult<Self> {
        Self::new(&RelayConfig::default())
    }

    /// Screen an outbound URL through validation, domain policy, and rate
    /// limiting, logging every decision.
    #[must_use]
    pub fn screen_url(&self, url: &str) -> ScreenDecision {
        let validation = self.sanitizer.validate_url(url);
        if !validation.valid {
            let reason = validation
                .reason
                .unwrap_or_else(|| "invalid URL".to_string());
            self.logger.log_event(
                SecurityEventType::InvalidUrl,
                url,
                Severity::Medium,
                reason.clone(),
            );
            return ScreenDecision::deny(ScreenStage::UrlValidation, Some(reason), None);
        }

        if let Some(decision) = self.guard_stage(url) {
            return decision;
        }

        if let Some(decision) = self.limit_stage(url) {
            return decision;
        }

        self.logger.log_request(url);
        ScreenDecision::allow()
    }

    /// Domain policy stage. `None` means proceed.
    fn guard_stage(&self, url: &str) -> Option<ScreenDecision> {
        match self.guard.check_domain(url) {
            Ok(decision) if decision.allowed => None,
            Ok(decision) => Some(ScreenDecision::deny(
                ScreenStage::DomainPolicy,
                decision.reason,
                None,
            )),
            Err(err) => {
                self.fail_open("connection guard", url, &err);
                None
            }
        }
    }

    /// Rate limit stage. `None` means proceed.
    fn limit_stage(&self, url: &str) -> Option<ScreenDecision> {
        match self.limiter.check(url) {
            Ok(decision) if decision.allowed => None,
            Ok(decision) => {
                self.logger.log_event(
                    SecurityEventType::RateLimitExceeded,
                    url,
                    Severity::Medium,
                    decision
                        .reason
                        .clone()
                        .unwrap_or_else(|| "rate limited".to_string()),
                );
                Some(ScreenDecision::deny(
                    ScreenStage::RateLimit,
                    decision.reason,
                    decision.wait_secs,
                ))
            }
            Err(err) => {
                self.fail_open("rate limiter", url, &err);
                None
            }
        }
    }

    fn fail_open(&self, component: &str, url: &str, err: &crate::error::SafetyError) {
        error!(component, url, error = %err, "safety component failed, failing open");
        self.logger.log_event(
            SecurityEventType::WebRequest,
            url,
            Severity::Critical,
            format!("{component} failed ({err}); request allowed to proceed"),
        );
    }

    /// Clean text ingested from the web: full HTML and text sanitization.
    #[must_use]
    pub fn clean_web_content(&self, raw: &str) -> String {
        let without_markup = self.sanitizer.sanitize_html(raw);
        self.sanitizer.sanitize_text(&without_markup)
    }

    /// Clean a provider reply: control-character stripping only.
    #[must_use]
    pub fn clean_model_output(&self, raw: &str) -> String {
        self.sanitizer.sanitize_model_output(raw)
    }

    /// The shared security logger.
    #[must_use]
    pub fn logger(&self) -> &Arc<SecurityLogger> {
        &self.logger
    }

    /// The connection guard (for attempt-log inspection).
    #[must_use]
    pub fn guard(&self) -> &ConnectionGuard {
        &self.guard
    }

    /// The rate limiter (for stats and resets).
    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The content sanitizer.
    #[must_use]
    pub fn sanitizer(&self) -> &ContentSanitizer {
        &self.sanitizer
    }
}
