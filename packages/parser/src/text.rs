//! Normalization of page text produced by PDF extraction.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Runs of horizontal whitespace inside a line.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INLINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}]+").expect("valid regex"));

/// Normalize extracted page text before header matching.
///
/// - NFKC folding, so ligatures such as `ﬁ` become `fi`
/// - CRLF and lone CR become LF
/// - horizontal whitespace runs collapse to one space, lines are trimmed
///
/// The section sign `§` is not affected by NFKC.
pub fn normalize_page_text(text: &str) -> String {
    let folded: String = text.nfkc().collect();
    let unified = folded.replace("\r\n", "\n").replace('\r', "\n");

    unified
        .lines()
        .map(|line| INLINE_WHITESPACE.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate a string to at most `max` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
