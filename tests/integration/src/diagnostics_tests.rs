//! Diagnostics surface tests: availability flags, credential presence, and
//! redacted error summaries.

use crate::mock_adapters::ScriptedAdapter;
use pretty_assertions::assert_eq;
use relay_core::{ErrorCategory, GenerationRequest, RelayError};
use relay_gateway::Relay;

#[tokio::test]
async fn test_snapshot_reports_flags_without_secrets() {
    let relay = Relay::builder()
        .adapter(ScriptedAdapter::builder("anthropic").credentialed().build())
        .adapter(ScriptedAdapter::builder("backup").unavailable().build())
        .build()
        .unwrap();

    let snapshot = relay.diagnostics();
    assert_eq!(snapshot.providers.len(), 2);

    let anthropic = &snapshot.providers[0];
    assert_eq!(anthropic.id, "anthropic");
    assert!(anthropic.available);
    assert!(anthropic.credentials_configured);

    let backup = &snapshot.providers[1];
    assert!(!backup.available);
    assert!(!backup.credentials_configured);

    // The serialized snapshot carries flags, never key material.
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"credentials_configured\":true"));
    assert!(!json.to_ascii_lowercase().contains("api_key"));
}

#[tokio::test]
async fn test_recent_errors_are_bounded_and_redacted() {
    let failing = ScriptedAdapter::always_err(
        "flaky",
        RelayError::provider("401", "rejected key sk-live-abcdef0123456789"),
    );
    let relay = Relay::builder().adapter(failing).build().unwrap();

    let request = GenerationRequest::new("hi", vec!["flaky".to_string()]);
    for _ in 0..3 {
        relay.generate(&request).await;
    }

    let snapshot = relay.diagnostics();
    assert_eq!(snapshot.recent_errors.len(), 3);
    for summary in &snapshot.recent_errors {
        assert_eq!(summary.provider, "flaky");
        assert_eq!(summary.category, ErrorCategory::ProviderError);
        assert!(
            !summary.message.contains("sk-live-abcdef0123456789"),
            "key material leaked into diagnostics: {}",
            summary.message
        );
    }
}

#[tokio::test]
async fn test_security_events_surface_through_facade() {
    let guarded = ScriptedAdapter::builder("guarded")
        .endpoint("https://blocked.example/api")
        .then_ok("never")
        .build();
    let mut config = relay_config::RelayConfig::default();
    config.guard.blacklist = vec!["blocked.example".to_string()];

    let relay = Relay::builder()
        .config(config)
        .adapter(guarded)
        .build()
        .unwrap();

    let request = GenerationRequest::new("hi", vec!["guarded".to_string()]);
    let resp = relay.generate(&request).await;
    assert!(!resp.success);

    let events = relay.security_events(10);
    assert!(!events.is_empty());
    assert_eq!(
        events[0].event_type,
        relay_safety::SecurityEventType::BlockedDomain
    );
}
