use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

static SENSITIVE_HEADER_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "authorization",
        "proxy-authorization",
        "x-api-key",
        "x-auth-token",
        "x-csrftoken",
        "cookie",
    ]
    .into_iter()
    .collect()
});

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"([?&]access_token=)[^&#\s]+").expect("inline redaction regex"),
            "${1}***REDACTED***",
        ),
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~+/=-]{4,})").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
    ]
});

/// Masks query-string tokens, bearer credentials and any caller-supplied secret values.
pub fn redact_text(value: &str, extra_secrets: &[&str]) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_REDACTION_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    for raw in extra_secrets {
        let needle = raw.trim();
        if needle.len() < 6 {
            continue;
        }
        out = out.replace(needle, INLINE_REDACTION);
    }
    out
}

pub fn is_sensitive_header(key: &str) -> bool {
    SENSITIVE_HEADER_KEYS.contains(key.trim().to_lowercase().as_str())
}

pub fn redact_headers<'a, I>(headers: I) -> Value
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut out = serde_json::Map::new();
    for (key, value) in headers {
        let rendered = if is_sensitive_header(key) {
            DEFAULT_REDACTION.to_string()
        } else {
            redact_text(value, &[])
        };
        out.insert(key.clone(), Value::String(rendered));
    }
    Value::Object(out)
}
