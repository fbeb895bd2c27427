//! Append-only audit trail of safety decisions and blocked attempts.
//!
//! Events live in two FIFO ring buffers bounded independently: one for
//! outbound request records, one for everything else (denials, internal
//! failures). Eviction is oldest-first by count, not time. Every event is
//! also mirrored to `tracing` under the `security` target so operators see
//! the trail without querying the buffers.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use relay_config::AuditSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::VecDeque;
use tracing::{info, warn};

/// Kind of safety event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    /// An outbound web request was allowed.
    WebRequest,
    /// A URL failed validation.
    InvalidUrl,
    /// A domain was denied by policy.
    BlockedDomain,
    /// A domain hit its rate limit.
    RateLimitExceeded,
}

impl std::fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WebRequest => write!(f, "web_request"),
            Self::InvalidUrl => write!(f, "invalid_url"),
            Self::BlockedDomain => write!(f, "blocked_domain"),
            Self::RateLimitExceeded => write!(f, "rate_limit_exceeded"),
        }
    }
}

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine observation.
    Low,
    /// Noteworthy but expected.
    Medium,
    /// Policy denial.
    High,
    /// Safety layer malfunction.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// One audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub event_type: SecurityEventType,
    /// The URL involved.
    pub url: String,
    /// How serious it is.
    pub severity: Severity,
    /// Free-form detail.
    pub details: String,
}

/// Counters over everything ever logged, independent of buffer eviction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SecurityStats {
    /// Total outbound requests recorded.
    pub total_requests: u64,
    /// Total non-request events recorded.
    pub total_events: u64,
    /// Event counts keyed by type label.
    pub by_type: HashMap<String, u64>,
}

#[derive(Debug, Default)]
struct Buffers {
    requests: VecDeque<SecurityEvent>,
    events: VecDeque<SecurityEvent>,
    stats: SecurityStats,
}

/// Append-only security logger.
#[derive(Debug)]
pub struct SecurityLogger {
    max_requests: usize,
    max_events: usize,
    inner: RwLock<Buffers>,
}

impl SecurityLogger {
    /// Create a logger with the given buffer bounds.
    #[must_use]
    pub fn new(settings: &AuditSettings) -> Self {
        Self {
            max_requests: settings.max_requests.max(1),
            max_events: settings.max_events.max(1),
            inner: RwLock::new(Buffers::default()),
        }
    }

    /// Create a logger with default bounds.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(&AuditSettings::default())
    }

    /// Record an allowed outbound request.
    pub fn log_request(&self, url: &str) {
        self.log_event(SecurityEventType::WebRequest, url, Severity::Low, "allowed");
    }

    /// Record a safety event.
    pub fn log_event(
        &self,
        event_type: SecurityEventType,
        url: &str,
        severity: Severity,
        details: impl Into<String>,
    ) {
        let event = SecurityEvent {
            timestamp: Utc::now(),
            event_type,
            url: url.to_string(),
            severity,
            details: details.into(),
        };

        self.emit(&event);

        let mut inner = self.inner.write();
        *inner
            .stats
            .by_type
            .entry(event.event_type.to_string())
            .or_insert(0) += 1;

        if event.event_type == SecurityEventType::WebRequest {
            inner.stats.total_requests += 1;
            while inner.requests.len() >= self.max_requests {
                inner.requests.pop_front();
            }
            inner.requests.push_back(event);
        } else {
            inner.stats.total_events += 1;
            while inner.events.len() >= self.max_events {
                inner.events.pop_front();
            }
            inner.events.push_back(event);
        }
    }

    /// Most recent outbound request records, newest first.
    #[must_use]
    pub fn recent_requests(&self, limit: usize) -> Vec<SecurityEvent> {
        let inner = self.inner.read();
        inner.requests.iter().rev().take(limit).cloned().collect()
    }

    /// Most recent safety events, newest first.
    #[must_use]
    pub fn recent_events(&self, limit: usize) -> Vec<SecurityEvent> {
        let inner = self.inner.read();
        inner.events.iter().rev().take(limit).cloned().collect()
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> SecurityStats {
        self.inner.read().stats.clone()
    }

    fn emit(&self, event: &SecurityEvent) {
        match event.severity {
            Severity::High | Severity::Critical => {
                warn!(
                    target: "security",
                    event_type = %event.event_type,
                    severity = %event.severity,
                    url = %event.url,
                    "{}",
                    event.details
                );
            }
            Severity::Low | Severity::Medium => {
                info!(
                    target: "security",
                    event_type = %event.event_type,
                    severity = %event.severity,
                    url = %event.url,
                    "{}",
                    event.details
                );
            }
        }
    }
}
