//! Payload sanitization.
//!
//! Stateless, deterministic, total functions that neutralize a value before it
//! is echoed anywhere: markup tags are stripped, the five HTML-significant
//! characters are entity-escaped, and a fixed denylist of SQL keywords and
//! comment markers is removed. The escape pass is entity-aware so the whole
//! string pass is idempotent: sanitizing already-sanitized text is a no-op.
//!
//! Recursion descends through maps and sequences, sanitizing every string
//! leaf; non-string leaves pass through unchanged. Map entries whose key looks
//! sensitive are replaced wholesale with [`REDACTED`] so secrets are never
//! echoed back, even in sanitized form.

use serde_json::Value;

/// Replacement for values of sensitive fields
pub const REDACTED: &str = "[REDACTED]";

/// Field-name substrings that mark a field as sensitive
const SENSITIVE_MARKERS: &[&str] = &["password", "token", "secret", "key", "auth"];

/// SQL keywords and comment markers removed from string leaves.
/// Matched case-insensitively.
const SQL_DENYLIST: &[&str] = &[
    "'", "--", "/*", "*/", "union", "select", "insert", "update", "delete", "drop", "create",
    "alter", "exec",
];

/// Entity bodies produced by [`escape_html`]; an `&` already introducing one
/// of these is left alone so repeated escaping is stable.
const ENTITY_BODIES: &[&str] = &["amp;", "lt;", "gt;", "quot;", "#39;"];

/// Sanitize a payload value recursively.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    if is_sensitive_field(key) {
                        (key.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (key.clone(), sanitize(value))
                    }
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Sanitize a single string: strip tags, escape entities, remove SQL patterns.
pub fn sanitize_str(input: &str) -> String {
    strip_sql_patterns(&escape_html(&strip_tags(input)))
}

/// Whether a field name matches the sensitive-field heuristic.
pub fn is_sensitive_field(field: &str) -> bool {
    let lower = field.to_lowercase();
    SENSITIVE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Remove complete `<...>` markup spans. An unpaired `<` is kept verbatim;
/// the escape pass neutralizes it.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape the five HTML-significant characters to their entity forms.
///
/// An `&` that already introduces one of the produced entities is emitted
/// verbatim, making the pass idempotent.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, ch) in input.char_indices() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '&' => {
                let rest = &input[i + 1..];
                if ENTITY_BODIES.iter().any(|body| rest.starts_with(body)) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Remove SQL denylist tokens, case-insensitively.
fn strip_sql_patterns(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut skip_until = 0;
    for (i, ch) in input.char_indices() {
        if i < skip_until {
            continue;
        }
        let matched = SQL_DENYLIST.iter().find_map(|pattern| {
            let end = i + pattern.len();
            (end <= input.len()
                && input.is_char_boundary(end)
                && input[i..end].eq_ignore_ascii_case(pattern))
            .then_some(end)
        });
        match matched {
            Some(end) => skip_until = end,
            None => out.push(ch),
        }
    }
    out
}
