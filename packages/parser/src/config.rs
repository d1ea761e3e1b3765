//! Configuration constants and validation functions for the parser.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ParserError, Result};

/// Default directory holding the `GLMFull <n>.pdf` corpus.
pub const DEFAULT_PDF_DIR: &str = "Guidelines/2025";

/// Default directory for per-chapter JSON output.
pub const DEFAULT_OUTPUT_DIR: &str = "data/2025/offenses";

/// Prefix used when recording which PDF a section came from.
///
/// Kept relative so the calculator can resolve it against its own asset root.
pub const PDF_REFERENCE_PREFIX: &str = "Guidelines/2025";

/// File stem shared by every document of the corpus.
pub const PDF_FILE_STEM: &str = "GLMFull";

/// Only sections whose identifier starts with this prefix are mapped.
pub const CHAPTER_PREFIX: &str = "2";

/// Minimum number of title characters after the section identifier.
pub const MIN_TITLE_LEN: usize = 11;

/// Further documents read past the start when a section has no known end.
pub const OPEN_END_LOOKAHEAD: u32 = 5;

/// Hard cap on documents read for a single section.
pub const MAX_SECTION_DOCUMENTS: u32 = 10;

/// Section identifier: digit, letter, optional digit, dot, digits.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SECTION_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d[A-Z]\d?\.\d+$").expect("valid regex"));

/// Chapter prefix: digit followed by a letter.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CHAPTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d[A-Z]$").expect("valid regex"));

/// Validate a section identifier.
///
/// # Examples
/// ```
/// use ussg_parser::config::validate_section_id;
///
/// assert!(validate_section_id("2K2.1").is_ok());
/// assert!(validate_section_id("2B1.10").is_ok());
/// assert!(validate_section_id("2K").is_err());
/// ```
pub fn validate_section_id(section: &str) -> Result<()> {
    if SECTION_ID_PATTERN.is_match(section) {
        Ok(())
    } else {
        Err(ParserError::InvalidSectionId(section.to_string()))
    }
}

/// Validate a chapter prefix such as `2K`.
///
/// # Examples
/// ```
/// use ussg_parser::config::validate_chapter;
///
/// assert!(validate_chapter("2K").is_ok());
/// assert!(validate_chapter("2K2.1").is_err());
/// ```
pub fn validate_chapter(chapter: &str) -> Result<()> {
    if CHAPTER_PATTERN.is_match(chapter) {
        Ok(())
    } else {
        Err(ParserError::InvalidChapter(chapter.to_string()))
    }
}

/// File name of the `n`th corpus document.
pub fn pdf_file_name(doc: u32) -> String {
    format!("{PDF_FILE_STEM} {doc}.pdf")
}

/// Reference string stored in the output for the `n`th corpus document.
pub fn pdf_reference(doc: u32) -> String {
    format!("{PDF_REFERENCE_PREFIX}/{}", pdf_file_name(doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_section_id_valid() {
        assert!(validate_section_id("2A1.1").is_ok());
        assert!(validate_section_id("2K2.1").is_ok());
        assert!(validate_section_id("2X7.2").is_ok());
        assert!(validate_section_id("2B1.10").is_ok());
        assert!(validate_section_id("2J.1").is_ok());
    }

    #[test]
    fn test_validate_section_id_invalid() {
        assert!(validate_section_id("").is_err());
        assert!(validate_section_id("2k2.1").is_err()); // Lowercase
        assert!(validate_section_id("2K22.1").is_err()); // Two part digits
        assert!(validate_section_id("§2K2.1").is_err());
        assert!(validate_section_id("2K2.").is_err());
    }

    #[test]
    fn test_validate_chapter() {
        assert!(validate_chapter("2K").is_ok());
        assert!(validate_chapter("2A").is_ok());
        assert!(validate_chapter("2").is_err());
        assert!(validate_chapter("K2").is_err());
        assert!(validate_chapter("2k").is_err());
    }

    #[test]
    fn test_pdf_reference() {
        assert_eq!(pdf_file_name(7), "GLMFull 7.pdf");
        assert_eq!(pdf_reference(212), "Guidelines/2025/GLMFull 212.pdf");
    }
}
