//! Content cleanup for imported free text
//!
//! Legacy exports often carry escape sequences as literal text (a backslash
//! followed by `r`, `n` or `t`) instead of control characters. This is a
//! display heuristic, not an unescaper.

use crate::legacy::{LegacyRow, LegacyValue};
use regex::Regex;
use std::sync::OnceLock;

/// Field the normalizer applies to
pub const CONTENT_FIELD: &str = "content";

struct Patterns {
    crlf: Regex,
    newline_or_tab: Regex,
    whitespace: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        crlf: Regex::new(r"\\r\\n").unwrap(),
        newline_or_tab: Regex::new(r"\\[nt]").unwrap(),
        whitespace: Regex::new(r"\s+").unwrap(),
    })
}

/// Collapse literal `\r\n`, `\n`, `\t` and whitespace runs to single spaces
pub fn normalize_text(text: &str) -> String {
    let p = patterns();
    let text = p.crlf.replace_all(text, " ");
    let text = p.newline_or_tab.replace_all(&text, " ");
    p.whitespace.replace_all(&text, " ").into_owned()
}

/// Normalize the `content` field of a row in place
///
/// Rows without content, or with empty or non-text content, are untouched.
/// Returns whether the row changed.
pub fn normalize_row(row: &mut LegacyRow) -> bool {
    let Some(LegacyValue::Text(content)) = row.get_mut(CONTENT_FIELD) else {
        return false;
    };
    if content.is_empty() {
        return false;
    }

    let cleaned = normalize_text(content);
    if cleaned == *content {
        return false;
    }
    *content = cleaned;
    true
}
