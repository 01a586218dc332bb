use std::sync::LazyLock;

use regex::Regex;

static TITLE_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-. ]").expect("title sanitizer regex should compile"));

static DIR_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\- ]").expect("dir sanitizer regex should compile"));

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("html tag regex should compile"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

/// Keep word characters, `-`, `.`, and spaces; trim the result.
///
/// Word characters are Unicode-aware, so accented titles survive.
pub fn sanitize_title(title: &str) -> String {
    TITLE_UNSAFE.replace_all(title, "").trim().to_string()
}

/// ASCII-only directory name; spaces and anything unsafe become `_`.
/// Falls back to `fallback` when nothing usable remains.
pub fn sanitize_dir_name(name: &str, fallback: &str) -> String {
    let cleaned = DIR_UNSAFE.replace_all(name.trim(), "_").replace(' ', "_");
    if cleaned.trim_matches('_').is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Drop markup and collapse whitespace.
pub fn strip_html_tags(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}
