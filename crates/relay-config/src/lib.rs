//! # Relay Config
//!
//! Configuration surface for the AI relay gateway. Owned by an external
//! loader at startup and consumed by the safety and orchestration layers:
//! rate-limit defaults and per-domain overrides, domain black/whitelists,
//! sanitizer denylists, cooldown and backoff durations, audit buffer sizes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod loader;
mod settings;

pub use loader::{ConfigError, ConfigResult};
pub use settings::{
    AuditSettings, DomainLimits, GuardSettings, OrchestratorSettings, RateLimitSettings,
    RelayConfig, SanitizerSettings,
};
