//! Safety subsystem error types.
//!
//! Denials are expected outcomes and are reported as decisions, not errors.
//! `SafetyError` covers the unexpected internal failures the pipeline fails
//! open on.

/// Result type for safety operations.
pub type SafetyResult<T> = std::result::Result<T, SafetyError>;

/// Safety subsystem error.
#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    /// Malformed input reached a component that expects pre-validated data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid component configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure.
    #[error("internal safety error: {0}")]
    Internal(String),
}

impl SafetyError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
