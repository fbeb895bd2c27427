//! Default pattern-based policy-block detection.
//!
//! Providers report safety refusals in wire-format-specific prose, so the
//! detection rules live here as data rather than inside the orchestrator.
//! Adapters needing provider-specific behavior supply their own
//! [`PolicyClassifier`] implementation instead.

use once_cell::sync::Lazy;
use regex::Regex;
use relay_core::PolicyClassifier;

/// Known provider-reported safety/content-policy indicators, paired with the
/// category recorded on the resulting error.
static POLICY_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)content[\s_-]*policy", "content_policy"),
        (r"(?i)content[\s_-]*(filter|filtering)", "content_filter"),
        (r"(?i)safety[\s_-]*(system|setting|filter|violation)", "safety_system"),
        (r"(?i)responsible[\s_-]*ai", "responsible_ai"),
        (r"(?i)harm[\s_-]*category", "harm_category"),
        (r"(?i)\bflagged\b.*\bmoderation\b|\bmoderation\b.*\bflagged\b", "moderation"),
        (r"(?i)blocked[\s_-]*by[\s_-]*(the)?[\s_-]*safety", "safety_block"),
        (r"(?i)violat\w+\s+(our|the|usage)\s+polic", "usage_policy"),
    ]
    .iter()
    .map(|(pattern, category)| (Regex::new(pattern).unwrap(), *category))
    .collect()
});

/// Classifier matching provider response bodies against known refusal
/// phrasings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternPolicyClassifier;

impl PatternPolicyClassifier {
    /// Create the default classifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PolicyClassifier for PatternPolicyClassifier {
    fn classify(&self, _status: Option<u16>, body: &str) -> Option<String> {
        POLICY_PATTERNS
            .iter()
            .find(|(pattern, _)| pattern.is_match(body))
            .map(|(_, category)| (*category).to_string())
    }
}
