//! Read-only diagnostics snapshot for operational tooling.
//!
//! Exposes provider availability flags, the presence (never the values) of
//! configured credentials, and a bounded, redacted list of recent error
//! summaries.

use chrono::{DateTime, Utc};
use relay_orchestrator::ErrorSummary;
use serde::Serialize;

/// Per-provider diagnostic entry.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderDiagnostics {
    /// Provider id.
    pub id: String,
    /// Model the adapter serves.
    pub model: String,
    /// Whether the adapter reports itself usable.
    pub available: bool,
    /// Whether credentials are configured. Values are never exposed.
    pub credentials_configured: bool,
}

/// Snapshot returned by [`crate::Relay::diagnostics`].
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSnapshot {
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
    /// Registered providers, sorted by id.
    pub providers: Vec<ProviderDiagnostics>,
    /// Recent redacted error summaries, newest first.
    pub recent_errors: Vec<ErrorSummary>,
}
