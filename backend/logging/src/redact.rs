//! Log Redaction Layer
//!
//! Scrubs API keys, bearer tokens, and key-bearing query strings from backend
//! error text before it is logged.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9_\-]{20,})|(AIza[0-9A-Za-z_\-]{30,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)")
        .unwrap()
});
static QUERY_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([?&](?:key|api_key|token)=)[^&\s]+").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = QUERY_KEY_RE.replace_all(input, "${1}[REDACTED]");
    API_KEY_RE
        .replace_all(&redacted, "[REDACTED_TOKEN]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_bearer_and_openai_keys() {
        let raw = "401 from upstream: Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9 sk-abcdefghijklmnopqrstuvwxyz123456";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("eyJhbGci"));
        assert!(!clean.contains("sk-abcdef"));
        assert!(clean.starts_with("401 from upstream"));
    }

    #[test]
    fn redacts_key_query_parameter() {
        let raw = "error sending request for url (https://generativelanguage.googleapis.com/v1beta/models/x:generateContent?key=secret123&alt=json)";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("secret123"));
        assert!(clean.contains("?key=[REDACTED]&alt=json"));
    }
}
