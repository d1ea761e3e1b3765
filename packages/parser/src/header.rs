//! Section header detection.
//!
//! A primary header looks like `§2K2.1. Unlawful Receipt, Possession, ...` at
//! the start of a line. The same shape also appears in commentary and
//! cross-reference lists, so detection is a tunable policy rather than an
//! exact oracle: the filters below remove the common false positives, and
//! the tests pin the known misclassifications.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::{CHAPTER_PREFIX, MIN_TITLE_LEN};
use crate::types::SectionId;

/// Section sign + identifier + period + whitespace + capitalized title.
///
/// Titles cannot contain parentheses, which keeps subsection text such as
/// `(a) Base Offense Level` from being taken as a title.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^§(\d[A-Z]\d?\.\d+)\.\s+([A-Z][^()\n]*)").expect("valid regex")
});

/// A header found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub section: SectionId,
    pub title: String,
    /// Byte offset of the `§` within the page text.
    pub offset: usize,
}

/// Rules deciding which pattern matches count as primary headers.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    /// Identifiers must start with this prefix; `None` accepts all chapters.
    pub chapter_prefix: Option<String>,
    /// Minimum title length in characters.
    pub min_title_len: usize,
    /// Reject titles marked deleted.
    pub skip_deleted: bool,
    /// Reject headers whose line lies below this fraction of the page.
    pub max_line_ratio: Option<f32>,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self {
            chapter_prefix: Some(CHAPTER_PREFIX.to_string()),
            min_title_len: MIN_TITLE_LEN,
            skip_deleted: true,
            max_line_ratio: None,
        }
    }
}

impl HeaderPolicy {
    /// Restrict headers to the upper part of the page.
    #[must_use]
    pub fn with_max_line_ratio(mut self, ratio: f32) -> Self {
        self.max_line_ratio = Some(ratio);
        self
    }

    /// Accept headers from every chapter.
    #[must_use]
    pub fn all_chapters(mut self) -> Self {
        self.chapter_prefix = None;
        self
    }

    /// All headers accepted by this policy, in page order.
    pub fn find_headers(&self, text: &str) -> Vec<Header> {
        let line_count = text.lines().count().max(1);

        HEADER_PATTERN
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let raw_id = caps.get(1)?.as_str();
                let title = caps.get(2)?.as_str().trim();

                if let Some(prefix) = &self.chapter_prefix {
                    if !raw_id.starts_with(prefix.as_str()) {
                        return None;
                    }
                }
                if title.chars().count() < self.min_title_len {
                    return None;
                }
                if self.skip_deleted && is_deleted(title) {
                    return None;
                }
                if let Some(max_ratio) = self.max_line_ratio {
                    let line_index = text[..whole.start()].matches('\n').count();
                    #[allow(clippy::cast_precision_loss)]
                    let ratio = line_index as f32 / line_count as f32;
                    if ratio > max_ratio {
                        return None;
                    }
                }

                let section = SectionId::parse(raw_id).ok()?;
                Some(Header {
                    section,
                    title: title.to_string(),
                    offset: whole.start(),
                })
            })
            .collect()
    }

    /// First accepted header for `section` on the page.
    pub fn find_own_header(&self, text: &str, section: &SectionId) -> Option<Header> {
        self.find_headers(text)
            .into_iter()
            .find(|h| &h.section == section)
    }

    /// First accepted header for any other section at or after `from`.
    pub fn find_foreign_header(
        &self,
        text: &str,
        section: &SectionId,
        from: usize,
    ) -> Option<Header> {
        self.find_headers(text)
            .into_iter()
            .find(|h| h.offset >= from && &h.section != section)
    }
}

fn is_deleted(title: &str) -> bool {
    title.contains("[Deleted]") || title.to_lowercase().contains("deleted")
}
