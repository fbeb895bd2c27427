//! Adapter-contract tests: HTTP classification feeding the fallback chain.

use crate::mock_adapters::ScriptedAdapter;
use pretty_assertions::assert_eq;
use relay_adapters::{classify_response, PatternPolicyClassifier};
use relay_config::RelayConfig;
use relay_core::{ErrorCategory, GenerationRequest, RelayError};
use relay_gateway::Relay;
use std::time::Duration;

/// Simulate an adapter mapping an upstream response, then feed the result
/// through the chain the way a real adapter would raise it.
fn classify(status: u16, body: &str) -> Option<RelayError> {
    classify_response(status, body, &PatternPolicyClassifier::new())
}

#[test]
fn test_classification_order_policy_before_status() {
    // A policy payload is terminal whatever the status says.
    for status in [200, 400, 429, 500] {
        let err = classify(status, "your request violates our content policy").unwrap();
        assert!(err.is_terminal(), "status {status} must not mask a policy block");
    }

    // Without the payload, the status mapping applies.
    assert!(classify(429, "try again later").unwrap().is_rate_limited());
    assert!(matches!(
        classify(502, "bad gateway").unwrap(),
        RelayError::Provider { .. }
    ));
    assert!(classify(200, "{\"text\":\"fine\"}").is_none());
}

#[tokio::test]
async fn test_classified_policy_block_stops_chain_end_to_end() {
    // The error an adapter would raise for a policy-shaped 400.
    let classified = classify(400, "prompt was blocked by safety settings").unwrap();

    let a = ScriptedAdapter::builder("A").then_err(classified).build();
    let b = ScriptedAdapter::always_ok("B", "should never run");
    let mut config = RelayConfig::default();
    config.orchestrator.attempt_backoff = Duration::from_millis(5);

    let relay = Relay::builder()
        .config(config)
        .adapter(a)
        .adapter(b.clone())
        .build()
        .unwrap();

    let resp = relay
        .generate(&GenerationRequest::new(
            "hi",
            vec!["A".to_string(), "B".to_string()],
        ))
        .await;

    assert!(!resp.success);
    assert_eq!(resp.meta.error_category, Some(ErrorCategory::AiResponseError));
    assert_eq!(resp.meta.provider_attempts, vec!["A"]);
    assert_eq!(b.calls(), 0);
}

#[tokio::test]
async fn test_classified_server_error_falls_back_end_to_end() {
    let classified = classify(503, "service unavailable").unwrap();

    let a = ScriptedAdapter::builder("A").then_err(classified).build();
    let b = ScriptedAdapter::always_ok("B", "recovered");
    let mut config = RelayConfig::default();
    config.orchestrator.attempt_backoff = Duration::from_millis(5);

    let relay = Relay::builder()
        .config(config)
        .adapter(a)
        .adapter(b)
        .build()
        .unwrap();

    let resp = relay
        .generate(&GenerationRequest::new(
            "hi",
            vec!["A".to_string(), "B".to_string()],
        ))
        .await;

    assert!(resp.success);
    assert_eq!(resp.response.as_deref(), Some("recovered"));
    assert_eq!(resp.meta.provider_attempts, vec!["A", "B"]);
}
