//! # Relay Safety
//!
//! Safety layer for the AI relay gateway:
//! - Content sanitizer (HTML/script stripping, text normalization, URL
//!   validation with a lexical SSRF guard)
//! - Connection guard (domain allow/deny policy)
//! - Rate limiter (per-domain minute/hour caps with cooldown)
//! - Security logger (bounded append-only audit trail)
//! - The composed [`SafetyPipeline`] with fail-open semantics
//!
//! Denials are expected outcomes reported as decisions with reasons; errors
//! are reserved for internal failures, which the pipeline fails open on.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod rate_limit;
pub mod sanitize;

// Re-export main types
pub use audit::{SecurityEvent, SecurityEventType, SecurityLogger, SecurityStats, Severity};
pub use error::{SafetyError, SafetyResult};
pub use guard::{ConnectionAttempt, ConnectionGuard, GuardDecision};
pub use pipeline::{SafetyPipeline, ScreenDecision, ScreenStage};
pub use rate_limit::{RateDecision, RateLimiter, RateLimiterStats};
pub use sanitize::{ContentSanitizer, UrlDecision};
