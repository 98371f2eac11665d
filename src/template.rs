//! Placeholder substitution for request templates and URL templates.
//!
//! Three tokens are recognised:
//!
//! | Token | Value |
//! |-------|-------|
//! | `{ts}` | current epoch time in milliseconds |
//! | `{page}` | current 1-based page number |
//! | `{oid}` | the per-item identifier |
//!
//! Substitution is plain text replacement. A token whose value is not known
//! yet (for example `{oid}` while building a page request) is left in place
//! so a later pass can fill it in.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const TS_TOKEN: &str = "{ts}";
pub const PAGE_TOKEN: &str = "{page}";
pub const ID_TOKEN: &str = "{oid}";

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[A-Za-z_][A-Za-z0-9_]*\}").expect("placeholder regex is valid"));

/// The values available for one substitution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    pub ts: Option<String>,
    pub page: Option<String>,
    pub id: Option<String>,
}

impl Placeholders {
    /// Values for building the request of a given page.
    pub fn for_page(ts_millis: i64, page: u32) -> Self {
        Self {
            ts: Some(ts_millis.to_string()),
            page: Some(page.to_string()),
            id: None,
        }
    }

    /// Values for synthesising an item URL.
    pub fn for_item(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Replace every known token in `text`.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (token, value) in [
            (TS_TOKEN, &self.ts),
            (PAGE_TOKEN, &self.page),
            (ID_TOKEN, &self.id),
        ] {
            if let Some(value) = value {
                if out.contains(token) {
                    out = out.replace(token, value);
                }
            }
        }
        out
    }

    /// Substitute into a configured header/param value.
    ///
    /// String literals are templated; numbers, booleans and other non-string
    /// literals pass through untouched.
    pub fn apply_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.apply(s)),
            other => other.clone(),
        }
    }
}

/// Placeholder-looking tokens still present in `text`, in order of
/// appearance.
pub fn unresolved(text: &str) -> Vec<&str> {
    PLACEHOLDER_RE.find_iter(text).map(|m| m.as_str()).collect()
}
