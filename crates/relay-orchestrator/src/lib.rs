//! # Relay Orchestrator
//!
//! Drives the ordered provider fallback chain for one logical request:
//! strictly sequential attempts, pre-flight safety screening, terminal-stop
//! on policy blocks, bounded backoff after upstream rate limits, and a
//! redacted recent-error feed for diagnostics.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diagnostics;
pub mod fallback;

// Re-export main types
pub use diagnostics::ErrorSummary;
pub use fallback::FallbackOrchestrator;
