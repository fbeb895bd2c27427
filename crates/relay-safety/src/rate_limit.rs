//! Per-domain outbound rate limiting.
//!
//! Each domain carries two independent caps (requests per trailing minute
//! and per trailing hour) plus a cooldown entered when the hourly cap is
//! exceeded. Cooldown state is independent of the windows: the minute window
//! clearing cannot short-circuit an active cooldown. Timestamps older than
//! one hour are pruned lazily on check.

use crate::error::{SafetyError, SafetyResult};
use crate::guard::host_of;
use parking_lot::Mutex;
use relay_config::RateLimitSettings;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::debug;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Outcome of a rate-limit check.
#[derive(Debug, Clone)]
pub struct RateDecision {
    /// Whether the request may proceed now.
    pub allowed: bool,
    /// Why it was denied, when it was.
    pub reason: Option<String>,
    /// Seconds until a retry can succeed, when denied.
    pub wait_secs: Option<u64>,
}

impl RateDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            wait_secs: None,
        }
    }

    fn deny(reason: impl Into<String>, wait_secs: u64) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            wait_secs: Some(wait_secs),
        }
    }
}

#[derive(Debug, Default)]
struct DomainState {
    /// Timestamps of allowed requests, oldest first. Bounded by the 1-hour
    /// retention window.
    timestamps: VecDeque<Instant>,
    cooldown_until: Option<Instant>,
}

/// Snapshot of limiter state for operational tooling.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterStats {
    /// Domains with recorded state.
    pub domains_tracked: usize,
    /// Domains currently serving a cooldown.
    pub domains_in_cooldown: usize,
}

/// Token-bucket limiter over outbound domains.
pub struct RateLimiter {
    settings: RateLimitSettings,
    state: Mutex<HashMap<String, DomainState>>,
}

impl RateLimiter {
    /// Create a limiter from configuration.
    #[must_use]
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Create a limiter with default caps.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RateLimitSettings::default())
    }

    /// Check whether a request to `url`'s domain may proceed, recording it
    /// when allowed.
    ///
    /// # Errors
    /// Returns an error only when the URL has no extractable host; callers
    /// validate URLs first, so this signals an internal ordering bug.
    pub fn check(&self, url: &str) -> SafetyResult<RateDecision> {
        self.check_at(url, Instant::now())
    }

    fn check_at(&self, url: &str, now: Instant) -> SafetyResult<RateDecision> {
        let domain = host_of(url)
            .ok_or_else(|| SafetyError::validation(format!("no host in URL: {url}")))?;
        let limits = self.settings.limits_for(&domain);

        let mut state = self.state.lock();
        let entry = state.entry(domain.clone()).or_default();

        // Lazy pruning: drop anything outside the hourly retention window.
        while let Some(front) = entry.timestamps.front() {
            if now.saturating_duration_since(*front) > HOUR {
                entry.timestamps.pop_front();
            } else {
                break;
            }
        }

        // An active cooldown denies regardless of window contents.
        if let Some(until) = entry.cooldown_until {
            if until > now {
                let wait = until.saturating_duration_since(now).as_secs().max(1);
                return Ok(RateDecision::deny(
                    format!("domain {domain} is cooling down after exceeding its hourly limit"),
                    wait,
                ));
            }
            entry.cooldown_until = None;
        }

        if entry.timestamps.len() as u32 >= limits.requests_per_hour {
            entry.cooldown_until = Some(now + self.settings.cooldown);
            debug!(domain = %domain, "hourly rate limit exceeded, entering cooldown");
            return Ok(RateDecision::deny(
                format!(
                    "domain {domain} exceeded {} requests per hour",
                    limits.requests_per_hour
                ),
                self.settings.cooldown.as_secs().max(1),
            ));
        }

        let minute_count = entry
            .timestamps
            .iter()
            .rev()
            .take_while(|ts| now.saturating_duration_since(**ts) <= MINUTE)
            .count() as u32;

        if minute_count >= limits.requests_per_minute {
            // Wait until the oldest request inside the minute window ages out.
            let oldest_in_minute = entry
                .timestamps
                .iter()
                .find(|ts| now.saturating_duration_since(**ts) <= MINUTE);
            let wait = oldest_in_minute.map_or(1, |ts| {
                let elapsed = now.saturating_duration_since(*ts);
                MINUTE.saturating_sub(elapsed).as_secs().max(1)
            });
            return Ok(RateDecision::deny(
                format!(
                    "domain {domain} exceeded {} requests per minute",
                    limits.requests_per_minute
                ),
                wait,
            ));
        }

        entry.timestamps.push_back(now);
        Ok(RateDecision::allow())
    }

    /// Clear all recorded state for `domain`.
    pub fn reset(&self, domain: &str) {
        self.state.lock().remove(&domain.to_ascii_lowercase());
    }

    /// Snapshot of tracked domains and active cooldowns.
    #[must_use]
    pub fn stats(&self) -> RateLimiterStats {
        let now = Instant::now();
        let state = self.state.lock();
        RateLimiterStats {
            domains_tracked: state.len(),
            domains_in_cooldown: state
                .values()
                .filter(|s| s.cooldown_until.is_some_and(|until| until > now))
                .count(),
        }
    }
}
