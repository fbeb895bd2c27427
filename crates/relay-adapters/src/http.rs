//! HTTP failure classification for adapter implementors.
//!
//! Adapters map every upstream failure into exactly one taxonomy kind. The
//! policy predicate runs before status mapping: a 400 can be either a
//! malformed request or a genuine policy block, and only the payload
//! distinguishes them.

use relay_core::{PolicyClassifier, RelayError};
use std::time::Duration;
use tracing::debug;

/// Cap on how much of an upstream body lands in an error message.
const BODY_SNIPPET_LEN: usize = 240;

/// Classify an upstream HTTP response.
///
/// Returns `None` for a usable success, or the taxonomy error the adapter
/// must raise. The policy predicate is consulted first regardless of status,
/// so a refusal delivered with a 200 still classifies as terminal.
pub fn classify_response(
    status: u16,
    body: &str,
    policy: &dyn PolicyClassifier,
) -> Option<RelayError> {
    if let Some(category) = policy.classify(Some(status), body) {
        debug!(status, category = %category, "upstream response classified as policy block");
        return Some(RelayError::ai_response(category, snippet(body)));
    }

    if (200..300).contains(&status) {
        return None;
    }

    Some(RelayError::from_status(status, snippet(body)))
}

/// Classify a transport-level `reqwest` failure.
///
/// `timeout` is the adapter's configured request timeout, recorded on the
/// `Timeout` kind when the client gave up waiting.
pub fn classify_transport_error(err: &reqwest::Error, timeout: Duration) -> RelayError {
    if err.is_timeout() {
        return RelayError::timeout(timeout);
    }
    if err.is_connect() {
        return RelayError::network(format!("connection failed: {err}"));
    }
    RelayError::provider("unknown", err.to_string())
}

/// Truncate an upstream body for inclusion in an error message.
fn snippet(body: &str) -> String {
    if body.len() <= BODY_SNIPPET_LEN {
        return body.to_string();
    }
    let mut end = BODY_SNIPPET_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
