//! # Relay Adapters
//!
//! Support for provider adapter implementations:
//! - HTTP status and transport-error classification into the relay taxonomy
//! - The default pattern-based policy-block classifier
//!
//! Concrete vendor adapters live with their owners; this crate holds the
//! shared classification machinery that keeps them honest about the
//! taxonomy contract.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod http;
pub mod policy;

// Re-export main types
pub use http::{classify_response, classify_transport_error};
pub use policy::PatternPolicyClassifier;
