use regex::Regex;
use std::sync::LazyLock;

const PREVIEW_CHARS: usize = 160;

// Tried in order; only the first match is removed.
static ORDINAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(?i:[ivxlcdm]+)(?:\.\s*|\s+|$)", // III. / iv
        r"^\d+(?:\.\s*|\s+|$)",             // 12. / 3
        r"^\p{L}\.\s*",                     // a. / B.
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Canonical form used for fuzzy title comparison.
///
/// Drops `. , : ; " '` and tabs, turns `-`/`_` into spaces and collapses
/// whitespace runs. The result is trimmed, so the function is idempotent.
pub fn normalize(s: &str) -> String {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | ':' | ';' | '"' | '\'' | '\t'))
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes a single leading ordinal token (roman numeral, digit run, or
/// lettered marker such as `a.`). Never applied twice.
pub fn strip_leading_ordinal(s: &str) -> String {
    for regex in ORDINAL_PATTERNS.iter() {
        if let Some(found) = regex.find(s) {
            return s[found.end()..].to_string();
        }
    }
    s.to_string()
}

/// Truncated single-line rendering of arbitrary text for log fields.
pub fn preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    let flat = trimmed.replace(['\n', '\r'], " ");
    let total = flat.chars().count();
    if total > PREVIEW_CHARS {
        let head: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}... ({} chars total)", head, total)
    } else {
        flat
    }
}
