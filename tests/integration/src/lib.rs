//! Integration tests for the AI relay gateway
//!
//! Covers the complete request flow through the facade:
//! - Fallback chains across scripted providers
//! - Terminal-stop and retry/advance semantics
//! - HTTP classification feeding the chain (adapter contract)
//! - Safety pipeline behavior (sanitizer, guard, rate limiter, audit trail)
//! - Diagnostics surface

pub mod mock_adapters;

pub use mock_adapters::*;

#[cfg(test)]
mod adapter_tests;
#[cfg(test)]
mod diagnostics_tests;
#[cfg(test)]
mod e2e_tests;
