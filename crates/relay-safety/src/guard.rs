//! Domain allow/deny policy for outbound fetches.
//!
//! Policy order: a non-empty whitelist is authoritative (the blacklist is
//! not consulted for it); otherwise the blacklist denies; otherwise allow.
//! Every check lands in a bounded attempt log, and denials are mirrored to
//! the security logger with high severity.

use crate::audit::{SecurityEventType, SecurityLogger, Severity};
use crate::error::{SafetyError, SafetyResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use relay_config::GuardSettings;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use url::Url;

/// Outcome of a domain policy check.
#[derive(Debug, Clone)]
pub struct GuardDecision {
    /// Whether the fetch may proceed.
    pub allowed: bool,
    /// Why it was denied, when it was.
    pub reason: Option<String>,
}

impl GuardDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// One entry in the connection-attempt log.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionAttempt {
    /// When the check ran.
    pub timestamp: DateTime<Utc>,
    /// The URL checked.
    pub url: String,
    /// The extracted domain.
    pub domain: String,
    /// Whether it was allowed.
    pub allowed: bool,
    /// Denial reason, when denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Domain allow/deny policy gate.
pub struct ConnectionGuard {
    whitelist: Vec<String>,
    blacklist: Vec<String>,
    max_attempt_log: usize,
    attempts: Mutex<VecDeque<ConnectionAttempt>>,
    logger: Arc<SecurityLogger>,
}

impl ConnectionGuard {
    /// Create a guard from configuration.
    #[must_use]
    pub fn new(settings: &GuardSettings, logger: Arc<SecurityLogger>) -> Self {
        Self {
            whitelist: normalize(&settings.whitelist),
            blacklist: normalize(&settings.blacklist),
            max_attempt_log: settings.max_attempt_log.max(1),
            attempts: Mutex::new(VecDeque::new()),
            logger,
        }
    }

    /// Check whether `url`'s domain may be contacted.
    ///
    /// # Errors
    /// Returns an error only when the URL has no extractable host; callers
    /// validate URLs first, so this signals an internal ordering bug.
    pub fn check_domain(&self, url: &str) -> SafetyResult<GuardDecision> {
        let domain = host_of(url)
            .ok_or_else(|| SafetyError::validation(format!("no host in URL: {url}")))?;

        let decision = self.evaluate(&domain);
        self.record(url, &domain, &decision);

        if !decision.allowed {
            self.logger.log_event(
                SecurityEventType::BlockedDomain,
                url,
                Severity::High,
                decision
                    .reason
                    .clone()
                    .unwrap_or_else(|| "denied".to_string()),
            );
        }

        Ok(decision)
    }

    fn evaluate(&self, domain: &str) -> GuardDecision {
        if !self.whitelist.is_empty() {
            if self.whitelist.iter().any(|entry| domain_matches(domain, entry)) {
                return GuardDecision::allow();
            }
            return GuardDecision::deny(format!("domain {domain} not in whitelist"));
        }

        if self.blacklist.iter().any(|entry| domain_matches(domain, entry)) {
            return GuardDecision::deny(format!("domain {domain} is blacklisted"));
        }

        GuardDecision::allow()
    }

    fn record(&self, url: &str, domain: &str, decision: &GuardDecision) {
        let mut attempts = self.attempts.lock();
        while attempts.len() >= self.max_attempt_log {
            attempts.pop_front();
        }
        attempts.push_back(ConnectionAttempt {
            timestamp: Utc::now(),
            url: url.to_string(),
            domain: domain.to_string(),
            allowed: decision.allowed,
            reason: decision.reason.clone(),
        });
    }

    /// Most recent connection attempts, newest first.
    #[must_use]
    pub fn recent_attempts(&self, limit: usize) -> Vec<ConnectionAttempt> {
        let attempts = self.attempts.lock();
        attempts.iter().rev().take(limit).cloned().collect()
    }
}

fn normalize(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Exact or dot-suffix match, so `a.com` covers `api.a.com`.
fn domain_matches(domain: &str, entry: &str) -> bool {
    domain == entry || domain.ends_with(&format!(".{entry}"))
}

/// Lowercased host of `url`, when it has one.
pub(crate) fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(str::to_ascii_lowercase)
}
