//! End-to-end tests: complete request flows through the relay facade.

use crate::mock_adapters::ScriptedAdapter;
use pretty_assertions::assert_eq;
use relay_config::RelayConfig;
use relay_core::{ErrorCategory, ExecutionMode, GenerationRequest, RelayError};
use relay_gateway::Relay;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn fast_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.orchestrator.attempt_backoff = Duration::from_millis(10);
    config
}

fn request(chain: &[&str]) -> GenerationRequest {
    GenerationRequest::new("what is 2+2?", chain.iter().map(ToString::to_string).collect())
}

#[tokio::test]
async fn test_rate_limited_provider_falls_back() {
    let a = ScriptedAdapter::builder("A").then_rate_limited().build();
    let b = ScriptedAdapter::always_ok("B", "4");
    let relay = Relay::builder()
        .config(fast_config())
        .adapter(a.clone())
        .adapter(b.clone())
        .build()
        .unwrap();

    let resp = relay.generate(&request(&["A", "B"])).await;

    assert!(resp.success);
    assert_eq!(resp.response.as_deref(), Some("4"));
    assert_eq!(resp.meta.provider_attempts, vec!["A", "B"]);
    assert!(resp.meta.fallback_used);
    assert_eq!(resp.meta.provider, "B");
    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
}

#[tokio::test]
async fn test_policy_block_never_reaches_second_provider() {
    let a = ScriptedAdapter::builder("A")
        .then_policy_block("content_policy")
        .build();
    let b = ScriptedAdapter::always_ok("B", "an answer");
    let relay = Relay::builder()
        .config(fast_config())
        .adapter(a.clone())
        .adapter(b.clone())
        .build()
        .unwrap();

    let resp = relay.generate(&request(&["A", "B"])).await;

    assert!(!resp.success);
    assert!(resp.response.is_none());
    assert_eq!(resp.meta.provider_attempts, vec!["A"]);
    assert!(!resp.meta.fallback_used);
    assert_eq!(resp.meta.error_category, Some(ErrorCategory::AiResponseError));
    assert_eq!(b.calls(), 0, "a policy block must stop the chain");
}

#[tokio::test]
async fn test_retryable_failures_walk_the_chain_in_order() {
    let a = ScriptedAdapter::always_err("A", RelayError::timeout(Duration::from_secs(5)));
    let b = ScriptedAdapter::always_err("B", RelayError::network("connection reset"));
    let c = ScriptedAdapter::always_ok("C", "third time lucky");
    let relay = Relay::builder()
        .config(fast_config())
        .adapter(a)
        .adapter(b)
        .adapter(c)
        .build()
        .unwrap();

    let resp = relay.generate(&request(&["A", "B", "C"])).await;

    assert!(resp.success);
    assert_eq!(resp.meta.provider_attempts, vec!["A", "B", "C"]);
    assert_eq!(resp.meta.provider, "C");
    assert!(resp.meta.fallback_used);
}

#[tokio::test]
async fn test_exhausted_chain_classifies_from_last_failure() {
    let a = ScriptedAdapter::always_err("A", RelayError::provider("503", "down"));
    let b = ScriptedAdapter::always_err("B", RelayError::network("refused"));
    let relay = Relay::builder()
        .config(fast_config())
        .adapter(a)
        .adapter(b)
        .build()
        .unwrap();

    let resp = relay.generate(&request(&["A", "B"])).await;

    assert!(!resp.success);
    assert_eq!(resp.meta.provider_attempts.len(), 2);
    assert!(resp.meta.fallback_used);
    assert_eq!(resp.meta.error_category, Some(ErrorCategory::NetworkError));
    assert!(resp.meta.error.is_some());
    assert!(resp.meta.invariant_holds());
}

#[tokio::test]
async fn test_prompt_identical_for_every_adapter() {
    let a = ScriptedAdapter::always_err("A", RelayError::provider("500", "boom"));
    let b = ScriptedAdapter::always_ok("B", "done");
    let relay = Relay::builder()
        .config(fast_config())
        .adapter(a.clone())
        .adapter(b.clone())
        .build()
        .unwrap();

    let prompt = "prompt with unicode Ωé and\nnewlines";
    let req = GenerationRequest::new(prompt, vec!["A".to_string(), "B".to_string()]);
    relay.generate(&req).await;

    assert_eq!(a.prompts(), vec![prompt]);
    assert_eq!(b.prompts(), vec![prompt]);
}

#[tokio::test]
async fn test_failure_response_always_carries_meta() {
    let a = ScriptedAdapter::always_err("A", RelayError::network("reset"));
    let relay = Relay::builder()
        .config(fast_config())
        .adapter(a)
        .build()
        .unwrap();

    let resp = relay.generate(&request(&["A"])).await;

    assert!(!resp.success);
    assert!(resp.response.is_none(), "no fabricated text on failure");
    assert!(!resp.meta.request_id.is_empty());
    assert_eq!(resp.meta.provider_attempts, vec!["A"]);
    assert!(resp.meta.invariant_holds());
}

#[tokio::test]
async fn test_mode_and_usage_flow_into_meta() {
    let reply = relay_core::ProviderReply::new("researched answer").with_usage(120, 48);
    let a = ScriptedAdapter::builder("A").then_reply(reply).build();
    let relay = Relay::builder()
        .config(fast_config())
        .adapter(a)
        .build()
        .unwrap();

    let req = request(&["A"]).with_mode(ExecutionMode::Research);
    let resp = relay.generate(&req).await;

    assert!(resp.success);
    assert_eq!(resp.meta.mode, ExecutionMode::Research);
    assert_eq!(resp.meta.tokens_in, Some(120));
    assert_eq!(resp.meta.tokens_out, Some(48));
    assert_eq!(resp.meta.tokens_total, Some(168));
}

#[tokio::test]
async fn test_cancellation_preserves_partial_attempts() {
    let a = ScriptedAdapter::always_err("A", RelayError::provider("500", "boom"));
    let b = ScriptedAdapter::always_ok("B", "late");
    let relay = Relay::builder()
        .config(fast_config())
        .adapter(a)
        .adapter(b.clone())
        .build()
        .unwrap();

    // Cancel before the request starts: no attempt is made at all.
    let cancel = CancellationToken::new();
    cancel.cancel();
    let resp = relay
        .generate_cancellable(&request(&["A", "B"]), &cancel)
        .await;

    assert!(!resp.success);
    assert_eq!(resp.meta.error_category, Some(ErrorCategory::Timeout));
    assert!(resp.meta.provider_attempts.is_empty());
    assert_eq!(b.calls(), 0);
}

#[tokio::test]
async fn test_response_meta_serializes_for_callers() {
    let a = ScriptedAdapter::always_ok("A", "hello");
    let relay = Relay::builder()
        .config(fast_config())
        .adapter(a)
        .build()
        .unwrap();

    let resp = relay
        .generate(&request(&["A"]).with_request_id("req-e2e-1"))
        .await;
    let json = serde_json::to_value(&resp).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["response"], "hello");
    assert_eq!(json["meta"]["request_id"], "req-e2e-1");
    assert_eq!(json["meta"]["provider_attempts"][0], "A");
    assert_eq!(json["meta"]["fallback_used"], false);
    // Error fields are absent on success.
    assert!(json["meta"].get("error").is_none());
    assert!(json["meta"].get("error_category").is_none());
}
