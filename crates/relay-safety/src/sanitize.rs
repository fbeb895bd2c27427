//! Content sanitization for text ingested from the web or returned by a
//! provider.
//!
//! HTML sanitization runs as a fixpoint loop: each pass only deletes or
//! shrinks text, so the loop terminates, and the result of a second
//! invocation equals the first. Removal of a tag can splice surrounding
//! fragments into a new match (`<scr<script>ipt>`), which the next pass
//! catches.

use crate::error::{SafetyError, SafetyResult};
use once_cell::sync::Lazy;
use regex::Regex;
use relay_config::SanitizerSettings;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Attributes whose name begins with `on` (event handlers).
static EVENT_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on\w+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});

/// `href`/`src` values using the `javascript:` scheme.
static JS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(href|src)\s*=\s*(?:"\s*javascript:[^"]*"|'\s*javascript:[^']*'|javascript:[^\s>]*)"#)
        .unwrap()
});

/// Numeric and named HTML entities.
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#x?[0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap()
});

/// Runs of horizontal whitespace.
static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ \t]+").unwrap()
});

/// Three or more consecutive newlines.
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n{3,}").unwrap()
});

struct TagPatterns {
    /// Paired form: opening tag through matching closing tag, content included.
    paired: Regex,
    /// Opening, self-closing, or stray closing tag on its own.
    unpaired: Regex,
}

/// Decision returned by URL validation.
#[derive(Debug, Clone)]
pub struct UrlDecision {
    /// Whether the URL may be fetched.
    pub valid: bool,
    /// Why it was rejected, when invalid.
    pub reason: Option<String>,
}

impl UrlDecision {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Strips dangerous markup and validates outbound URLs.
pub struct ContentSanitizer {
    tags: Vec<TagPatterns>,
    blocked_extensions: Vec<String>,
}

impl ContentSanitizer {
    /// Build a sanitizer from configuration.
    ///
    /// # Errors
    /// Returns an error when a configured tag name cannot form a pattern.
    pub fn new(settings: &SanitizerSettings) -> SafetyResult<Self> {
        let mut tags = Vec::with_capacity(settings.denied_tags.len());
        for tag in &settings.denied_tags {
            let escaped = regex::escape(&tag.to_ascii_lowercase());
            let paired = Regex::new(&format!(r"(?is)<{escaped}\b[^>]*>.*?</{escaped}\s*>"))
                .map_err(|e| SafetyError::config(format!("tag pattern for {tag}: {e}")))?;
            let unpaired = Regex::new(&format!(r"(?i)</?{escaped}\b[^>]*>"))
                .map_err(|e| SafetyError::config(format!("tag pattern for {tag}: {e}")))?;
            tags.push(TagPatterns { paired, unpaired });
        }

        Ok(Self {
            tags,
            blocked_extensions: settings
                .blocked_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        })
    }

    /// Build a sanitizer with the default denylists.
    ///
    /// # Errors
    /// Propagates pattern-construction failures (not reachable with the
    /// shipped defaults).
    pub fn with_defaults() -> SafetyResult<Self> {
        Self::new(&SanitizerSettings::default())
    }

    /// Remove dangerous markup from HTML.
    ///
    /// Denylisted elements are removed tag-and-content, `on*` attributes are
    /// stripped, and `href`/`src` values with a `javascript:` scheme are
    /// rewritten to `"#"`. Idempotent.
    #[must_use]
    pub fn sanitize_html(&self, raw: &str) -> String {
        let mut current = raw.to_string();
        loop {
            let next = self.html_pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn html_pass(&self, input: &str) -> String {
        let mut out = input.to_string();
        for tag in &self.tags {
            out = tag.paired.replace_all(&out, "").into_owned();
            out = tag.unpaired.replace_all(&out, "").into_owned();
        }
        out = EVENT_ATTR.replace_all(&out, "").into_owned();
        out = JS_URL.replace_all(&out, "${1}=\"#\"").into_owned();
        out
    }

    /// Normalize plain text from an external source.
    ///
    /// Decodes HTML entities exactly once (normalizing encoding-obfuscated
    /// payloads), strips non-printable control characters, and collapses
    /// redundant whitespace.
    #[must_use]
    pub fn sanitize_text(&self, raw: &str) -> String {
        let decoded = decode_entities(raw);
        let stripped = strip_control_chars(&decoded);
        let normalized = stripped.replace("\r\n", "\n").replace('\r', "\n");
        let collapsed = HORIZONTAL_WS.replace_all(&normalized, " ");
        let collapsed = BLANK_RUNS.replace_all(&collapsed, "\n\n");
        collapsed.trim().to_string()
    }

    /// Minimal pass for provider replies: strip control characters only.
    ///
    /// Entity decoding and whitespace collapsing would corrupt code or
    /// markup the caller asked the model for.
    #[must_use]
    pub fn sanitize_model_output(&self, raw: &str) -> String {
        strip_control_chars(raw)
    }

    /// Lexically validate an outbound URL before any network activity.
    ///
    /// Checks the scheme, the path extension against the denylist, and the
    /// literal host against loopback/private ranges. No DNS resolution.
    #[must_use]
    pub fn validate_url(&self, raw: &str) -> UrlDecision {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => return UrlDecision::rejected(format!("malformed URL: {e}")),
        };

        match url.scheme() {
            "http" | "https" => {}
            other => return UrlDecision::rejected(format!("scheme '{other}' not allowed")),
        }

        if let Some(ext) = path_extension(url.path()) {
            if self.blocked_extensions.iter().any(|b| b == &ext) {
                return UrlDecision::rejected(format!("blocked file extension '.{ext}'"));
            }
        }

        match url.host() {
            Some(Host::Domain(domain)) => {
                let domain = domain.to_ascii_lowercase();
                if domain == "localhost" || domain.ends_with(".localhost") {
                    return UrlDecision::rejected("host resolves to loopback");
                }
            }
            Some(Host::Ipv4(ip)) => {
                if ip.is_loopback() {
                    return UrlDecision::rejected("host is a loopback address");
                }
                if is_private_v4(ip) {
                    return UrlDecision::rejected("host is a private-range address");
                }
                if ip.is_unspecified() {
                    return UrlDecision::rejected("host is an unspecified address");
                }
            }
            Some(Host::Ipv6(ip)) => {
                if ip.is_loopback() {
                    return UrlDecision::rejected("host is a loopback address");
                }
                if is_private_v6(ip) {
                    return UrlDecision::rejected("host is a private-range address");
                }
            }
            None => return UrlDecision::rejected("URL has no host"),
        }

        UrlDecision::ok()
    }
}

/// Extension of the last path segment, when it has one.
fn path_extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Decode HTML entities a single time.
fn decode_entities(input: &str) -> String {
    ENTITY
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let entity = &caps[0];
            let inner = &entity[1..entity.len() - 1];
            match inner {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                "nbsp" => " ".to_string(),
                _ => {
                    if let Some(rest) = inner.strip_prefix("#x").or_else(|| inner.strip_prefix("#X")) {
                        decode_codepoint(rest, 16).unwrap_or_else(|| entity.to_string())
                    } else if let Some(rest) = inner.strip_prefix('#') {
                        decode_codepoint(rest, 10).unwrap_or_else(|| entity.to_string())
                    } else {
                        entity.to_string()
                    }
                }
            }
        })
        .into_owned()
}

fn decode_codepoint(digits: &str, radix: u32) -> Option<String> {
    let value = u32::from_str_radix(digits, radix).ok()?;
    char::from_u32(value).map(|c| c.to_string())
}

/// Remove non-printable control characters, keeping newlines and tabs.
fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\r' || *c == '\t')
        .collect()
}

/// RFC 1918, link-local, and CGN IPv4 ranges.
fn is_private_v4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 10
        || (octets[0] == 172 && (16..=31).contains(&octets[1]))
        || (octets[0] == 192 && octets[1] == 168)
        || (octets[0] == 169 && octets[1] == 254)
        || (octets[0] == 100 && (64..=127).contains(&octets[1]))
}

/// Unique-local and link-local IPv6 ranges.
fn is_private_v6(ip: Ipv6Addr) -> bool {
    let segments = ip.segments();
    (segments[0] & 0xfe00) == 0xfc00 || (segments[0] & 0xffc0) == 0xfe80
}
