//! Configuration structs with serde defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RelayConfig {
    /// Outbound rate limiting.
    #[serde(default)]
    #[validate(nested)]
    pub rate_limit: RateLimitSettings,

    /// Domain allow/deny policy.
    #[serde(default)]
    pub guard: GuardSettings,

    /// Content sanitizer settings.
    #[serde(default)]
    #[validate(nested)]
    pub sanitizer: SanitizerSettings,

    /// Fallback orchestrator settings.
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,

    /// Security audit buffer sizes.
    #[serde(default)]
    #[validate(nested)]
    pub audit: AuditSettings,
}

impl RelayConfig {
    /// Validate the configuration, including cross-field rules serde
    /// defaults cannot express.
    ///
    /// # Errors
    /// Returns a message describing the first violated rule.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;
        for (domain, limits) in &self.rate_limit.per_domain {
            if limits.requests_per_minute == 0 || limits.requests_per_hour == 0 {
                return Err(format!("rate limit override for {domain} must be non-zero"));
            }
        }
        Ok(())
    }
}

/// Per-domain request caps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DomainLimits {
    /// Requests allowed in a trailing 60-second window.
    pub requests_per_minute: u32,
    /// Requests allowed in a trailing 1-hour window.
    pub requests_per_hour: u32,
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RateLimitSettings {
    /// Default per-minute cap for domains without an override.
    #[serde(default = "default_rpm")]
    #[validate(range(min = 1))]
    pub requests_per_minute: u32,

    /// Default per-hour cap for domains without an override.
    #[serde(default = "default_rph")]
    #[validate(range(min = 1))]
    pub requests_per_hour: u32,

    /// Cooldown applied to a domain once its hourly cap is exceeded.
    #[serde(default = "default_cooldown", with = "humantime_serde")]
    pub cooldown: Duration,

    /// Per-domain overrides keyed by domain name.
    #[serde(default)]
    pub per_domain: HashMap<String, DomainLimits>,
}

fn default_rpm() -> u32 {
    30
}

fn default_rph() -> u32 {
    500
}

fn default_cooldown() -> Duration {
    Duration::from_secs(300)
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_minute: default_rpm(),
            requests_per_hour: default_rph(),
            cooldown: default_cooldown(),
            per_domain: HashMap::new(),
        }
    }
}

impl RateLimitSettings {
    /// Effective limits for `domain`, honoring overrides.
    #[must_use]
    pub fn limits_for(&self, domain: &str) -> DomainLimits {
        self.per_domain.get(domain).copied().unwrap_or(DomainLimits {
            requests_per_minute: self.requests_per_minute,
            requests_per_hour: self.requests_per_hour,
        })
    }
}

/// Connection guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardSettings {
    /// Denied domains. Ignored for domains matching a non-empty whitelist.
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// When non-empty, only these domains are allowed.
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// Bound on the connection-attempt log.
    #[serde(default = "default_attempt_log")]
    pub max_attempt_log: usize,
}

fn default_attempt_log() -> usize {
    500
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            blacklist: Vec::new(),
            whitelist: Vec::new(),
            max_attempt_log: default_attempt_log(),
        }
    }
}

/// Content sanitizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SanitizerSettings {
    /// HTML elements removed wholesale, tag plus content.
    #[serde(default = "default_denied_tags")]
    #[validate(length(min = 1))]
    pub denied_tags: Vec<String>,

    /// Path extensions rejected by URL validation.
    #[serde(default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,
}

fn default_denied_tags() -> Vec<String> {
    [
        "script", "iframe", "object", "embed", "applet", "link", "style", "meta", "base", "form",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_blocked_extensions() -> Vec<String> {
    [
        "exe", "msi", "bat", "cmd", "scr", "pif", "vbs", "ps1", "jar", "apk", "dmg", "zip", "rar",
        "7z", "tar", "gz",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Default for SanitizerSettings {
    fn default() -> Self {
        Self {
            denied_tags: default_denied_tags(),
            blocked_extensions: default_blocked_extensions(),
        }
    }
}

/// Fallback orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    /// Fixed delay inserted before the next attempt after an upstream 429.
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub attempt_backoff: Duration,

    /// Default per-attempt timeout when the request carries none.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Bound on the recent-error diagnostics feed.
    #[serde(default = "default_error_feed")]
    pub max_recent_errors: usize,
}

fn default_backoff() -> Duration {
    Duration::from_millis(300)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_error_feed() -> usize {
    50
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            attempt_backoff: default_backoff(),
            request_timeout: default_request_timeout(),
            max_recent_errors: default_error_feed(),
        }
    }
}

/// Security audit buffer sizes. The two buffers are bounded independently.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AuditSettings {
    /// Retained `web_request` entries.
    #[serde(default = "default_max_requests")]
    #[validate(range(min = 1))]
    pub max_requests: usize,

    /// Retained safety events (denials, internal failures).
    #[serde(default = "default_max_events")]
    #[validate(range(min = 1))]
    pub max_events: usize,
}

fn default_max_requests() -> usize {
    200
}

fn default_max_events() -> usize {
    500
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            max_events: default_max_events(),
        }
    }
}
