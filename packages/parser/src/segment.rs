//! Splitting a section's text into base offense, specific offense
//! characteristics and cross reference regions.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BASE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Base Offense Level").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SOC_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Specific Offense Characteristics?").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static XREF_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Cross References?").expect("valid regex"));

/// One region of a section's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region<'a> {
    /// Byte span in the source text, before trimming. Empty when absent.
    pub span: Range<usize>,
    /// Region text with trailing whitespace removed.
    pub text: &'a str,
}

impl Region<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// The three ordered, non-overlapping regions of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments<'a> {
    pub base: Region<'a>,
    pub soc: Region<'a>,
    pub cross_reference: Region<'a>,
}

/// Start of a region: the literal marker, else the heading, searched from
/// `from` onward so region starts never go backwards.
fn find_start(text: &str, from: usize, marker: &str, heading: &Regex) -> Option<usize> {
    let haystack = &text[from..];
    haystack
        .find(marker)
        .or_else(|| heading.find(haystack).map(|m| m.start()))
        .map(|offset| from + offset)
}

/// Split section text into its three regions.
///
/// Each region starts at its subsection marker (`(a)`, `(b)`, `(c)`) or, when
/// the marker is absent, at its case-insensitive heading. A region with
/// neither is empty. A region ends where the next present region starts.
pub fn segment(text: &str) -> Segments<'_> {
    let base_start = find_start(text, 0, "(a)", &BASE_HEADING);
    let soc_start = find_start(text, base_start.unwrap_or(0), "(b)", &SOC_HEADING);
    let xref_from = soc_start.or(base_start).unwrap_or(0);
    let xref_start = find_start(text, xref_from, "(c)", &XREF_HEADING);

    let starts = [base_start, soc_start, xref_start];
    let region = |index: usize| -> Region<'_> {
        let next_start = starts[index + 1..]
            .iter()
            .flatten()
            .next()
            .copied()
            .unwrap_or(text.len());
        match starts[index] {
            Some(start) => Region {
                span: start..next_start,
                text: text[start..next_start].trim_end(),
            },
            None => Region {
                span: next_start..next_start,
                text: "",
            },
        }
    };

    Segments {
        base: region(0),
        soc: region(1),
        cross_reference: region(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Pad `prefix` with spaces so that the next text starts at `offset`.
    fn pad_to(prefix: &mut String, offset: usize) {
        while prefix.len() < offset {
            prefix.push(' ');
        }
    }

    #[test]
    fn test_marker_offsets() {
        let mut text = "§2K2.1. T".to_string();
        pad_to(&mut text, 10);
        text.push_str("(a) Base Offense Level (Apply the greatest): 26");
        pad_to(&mut text, 120);
        text.push_str("(b) Specific Offense Characteristics (1) If the offense involved");
        pad_to(&mut text, 300);
        text.push_str("(c) Cross Reference (1) If the defendant used any firearm");

        let segments = segment(&text);
        assert_eq!(segments.base.span, 10..120);
        assert_eq!(segments.soc.span, 120..300);
        assert_eq!(segments.cross_reference.span, 300..text.len());
        assert_eq!(
            segments.base.text,
            "(a) Base Offense Level (Apply the greatest): 26"
        );
    }

    #[test]
    fn test_heading_fallback() {
        let text = "BASE OFFENSE LEVEL: 6\nSPECIFIC OFFENSE CHARACTERISTIC\nIf x, increase by 2\nCross References\napply other";
        let segments = segment(text);
        assert_eq!(segments.base.text, "BASE OFFENSE LEVEL: 6");
        assert_eq!(
            segments.soc.text,
            "SPECIFIC OFFENSE CHARACTERISTIC\nIf x, increase by 2"
        );
        assert_eq!(segments.cross_reference.text, "Cross References\napply other");
    }

    #[test]
    fn test_missing_soc_and_xref() {
        let text = "§2A1.1. First Degree Murder\n(a) Base Offense Level: 43\n";
        let segments = segment(text);
        assert_eq!(segments.base.text, "(a) Base Offense Level: 43");
        assert!(segments.soc.is_empty());
        assert!(segments.cross_reference.is_empty());
        assert_eq!(segments.soc.span, text.len()..text.len());
    }

    #[test]
    fn test_no_markers_all_empty() {
        let segments = segment("Commentary only, nothing to see");
        assert!(segments.base.is_empty());
        assert!(segments.soc.is_empty());
        assert!(segments.cross_reference.is_empty());
    }

    #[test]
    fn test_marker_before_base_is_not_used() {
        // A stray "(b)" in the title must not pull the SOC region before (a).
        let text = "§2X9.9. Something (b) Odd Title\n(a) Base Offense Level: 8\n(b) Specific Offense Characteristics\n(1) +2";
        let segments = segment(text);
        assert_eq!(segments.base.text, "(a) Base Offense Level: 8");
        assert_eq!(
            segments.soc.text,
            "(b) Specific Offense Characteristics\n(1) +2"
        );
    }

    #[test]
    fn test_regions_ordered_and_disjoint() {
        let samples = [
            "(a) base (b) soc (c) xref",
            "(c) early (a) base (b) soc",
            "(b) only soc",
            "cross reference first, then Base Offense Level then (b)",
            "",
        ];
        for text in samples {
            let s = segment(text);
            assert!(s.base.span.end <= s.soc.span.start || s.base.span.is_empty() || s.soc.span.is_empty(), "{text}");
            assert!(s.base.span.start <= s.soc.span.start, "{text}");
            assert!(s.soc.span.start <= s.cross_reference.span.start, "{text}");
            assert!(s.soc.span.end <= s.cross_reference.span.start || s.cross_reference.span.is_empty(), "{text}");

            // Concatenation is a subsequence of the input modulo whitespace.
            let joined: String = [s.base.text, s.soc.text, s.cross_reference.text].concat();
            let compact = |t: &str| t.split_whitespace().collect::<String>();
            assert!(compact(text).contains(&compact(&joined)), "{text}");
        }
    }
}
