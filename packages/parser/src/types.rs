//! Core data types for the parser.
//!
//! Locations and extracted text live for a single run. Decision nodes and
//! specific offense characteristics are the durable output and serialize in
//! the camelCase shape the sentencing calculator reads.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::config::validate_section_id;
use crate::error::{ParserError, Result};

/// A validated guideline section identifier such as `2K2.1`.
///
/// Ordering is natural rather than lexicographic, so `2K2.2` sorts before
/// `2K2.10`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionId {
    raw: String,
    key: SortKey,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    chapter: u32,
    letter: char,
    part: Option<u32>,
    number: u32,
}

impl SectionId {
    /// Parse and validate an identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        validate_section_id(raw)?;
        let invalid = || ParserError::InvalidSectionId(raw.to_string());

        let (head, number) = raw.split_once('.').ok_or_else(invalid)?;
        let mut chars = head.chars();
        let chapter = chars.next().and_then(|c| c.to_digit(10)).ok_or_else(invalid)?;
        let letter = chars.next().ok_or_else(invalid)?;
        let part = chars.next().and_then(|c| c.to_digit(10));
        let number = number.parse::<u32>().map_err(|_| invalid())?;

        Ok(Self {
            raw: raw.to_string(),
            key: SortKey {
                chapter,
                letter,
                part,
                number,
            },
        })
    }

    /// The identifier as written, e.g. `2K2.1`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Two-character chapter prefix, e.g. `2K`.
    #[must_use]
    pub fn chapter(&self) -> &str {
        // Validated identifiers start with two ASCII characters.
        &self.raw[..2]
    }
}

impl PartialEq for SectionId {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for SectionId {}

impl Hash for SectionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Ord for SectionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for SectionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.raw)
    }
}

impl FromStr for SectionId {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SectionId {
    type Error = ParserError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SectionId> for String {
    fn from(id: SectionId) -> Self {
        id.raw
    }
}

/// A position in the corpus: 1-indexed document, 0-indexed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PagePosition {
    pub doc: u32,
    pub page: usize,
}

impl PagePosition {
    #[must_use]
    pub fn new(doc: u32, page: usize) -> Self {
        Self { doc, page }
    }
}

impl fmt::Display for PagePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document {} page {}", self.doc, self.page)
    }
}

/// Where one guideline section begins and ends in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionLocation {
    pub section: SectionId,
    pub title: String,
    /// Inclusive start.
    pub start: PagePosition,
    /// Exclusive end; `None` while unterminated.
    pub end: Option<PagePosition>,
}

/// Text belonging to exactly one section, already boundary-trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub section: SectionId,
    pub title: String,
    pub full_text: String,
    pub base_offense_text: String,
    pub soc_text: String,
    pub cross_reference_text: String,
    pub pdf_reference: String,
}

/// One of the two outcomes of a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Yes,
    No,
}

impl Branch {
    pub const BOTH: [Branch; 2] = [Branch::Yes, Branch::No];

    /// JSON key holding the follow-up node id.
    #[must_use]
    pub fn next_key(self) -> &'static str {
        match self {
            Self::Yes => "yesNext",
            Self::No => "noNext",
        }
    }

    /// JSON key holding the terminal result.
    #[must_use]
    pub fn result_key(self) -> &'static str {
        match self {
            Self::Yes => "yesResult",
            Self::No => "noResult",
        }
    }
}

/// Terminal outcome of a decision path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_level: Option<i32>,
    #[serde(default)]
    pub description: String,
}

/// Where a branch leads, as seen by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchTarget<'a> {
    Next(&'a str),
    Terminal(&'a TerminalResult),
    /// Neither a follow-up nor a result.
    Missing,
    /// Both a follow-up and a result.
    Ambiguous,
}

/// A base-offense question in the decision tree.
///
/// Branch fields mirror the interchange format; use [`DecisionNode::target`]
/// for a checked view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes_next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes_result: Option<TerminalResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_result: Option<TerminalResult>,
}

impl DecisionNode {
    /// Follow-up node id for a branch, if any.
    #[must_use]
    pub fn next(&self, branch: Branch) -> Option<&str> {
        match branch {
            Branch::Yes => self.yes_next.as_deref(),
            Branch::No => self.no_next.as_deref(),
        }
    }

    /// Terminal result for a branch, if any.
    #[must_use]
    pub fn result(&self, branch: Branch) -> Option<&TerminalResult> {
        match branch {
            Branch::Yes => self.yes_result.as_ref(),
            Branch::No => self.no_result.as_ref(),
        }
    }

    #[must_use]
    pub fn target(&self, branch: Branch) -> BranchTarget<'_> {
        match (self.next(branch), self.result(branch)) {
            (Some(next), None) => BranchTarget::Next(next),
            (None, Some(result)) => BranchTarget::Terminal(result),
            (None, None) => BranchTarget::Missing,
            (Some(_), Some(_)) => BranchTarget::Ambiguous,
        }
    }
}

/// Recognized SOC variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocKind {
    Select,
    YesNo,
}

impl SocKind {
    /// Parse the interchange `type` string.
    #[must_use]
    pub fn from_type(value: &str) -> Option<Self> {
        match value {
            "select" => Some(Self::Select),
            "yesno" => Some(Self::YesNo),
            _ => None,
        }
    }
}

/// One option of a `select` SOC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub adjustment: i32,
}

/// Effect of answering a `yesno` SOC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A specific offense characteristic: an independent adjustment rule.
///
/// `id` and `type` stay optional so malformed entries reach the validator
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificOffenseCharacteristic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes_effect: Option<Effect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_effect: Option<Effect>,
}

impl SpecificOffenseCharacteristic {
    /// Recognized variant, if the `type` is known.
    #[must_use]
    pub fn soc_kind(&self) -> Option<SocKind> {
        self.kind.as_deref().and_then(SocKind::from_type)
    }
}

/// Output entry for one section, as consumed by the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRules {
    pub title: String,
    pub section: String,
    pub pdf_reference: String,
    #[serde(default)]
    pub base_offense_questions: Vec<DecisionNode>,
    #[serde(default)]
    pub specific_offense_characteristics: Vec<SpecificOffenseCharacteristic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_section_id_natural_order() {
        let mut ids: Vec<SectionId> = ["2K2.10", "2K2.2", "2B1.1", "2K1.3", "2K2.1"]
            .iter()
            .map(|s| SectionId::parse(s).unwrap())
            .collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(SectionId::as_str).collect();
        assert_eq!(sorted, vec!["2B1.1", "2K1.3", "2K2.1", "2K2.2", "2K2.10"]);
    }

    #[test]
    fn test_section_id_chapter() {
        assert_eq!(SectionId::parse("2K2.1").unwrap().chapter(), "2K");
        assert_eq!(SectionId::parse("2J.1").unwrap().chapter(), "2J");
    }

    #[test]
    fn test_section_id_rejects_invalid() {
        assert!(SectionId::parse("K2.1").is_err());
        assert!("2K2.x".parse::<SectionId>().is_err());
    }

    #[test]
    fn test_decision_node_camel_case() {
        let json = serde_json::json!({
            "id": "base_1",
            "text": "Did the offense involve a semiautomatic firearm?",
            "type": "yesno",
            "yesResult": { "baseLevel": 26, "description": "High capacity" },
            "noNext": "base_2"
        });
        let node: DecisionNode = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(node.next(Branch::No), Some("base_2"));
        assert_eq!(node.result(Branch::Yes).and_then(|r| r.base_level), Some(26));
        assert_eq!(serde_json::to_value(&node).unwrap(), json);
    }

    #[test]
    fn test_branch_target() {
        let node = DecisionNode {
            id: "base_1".into(),
            yes_next: Some("base_2".into()),
            yes_result: Some(TerminalResult {
                base_level: Some(12),
                description: String::new(),
            }),
            ..Default::default()
        };
        assert_eq!(node.target(Branch::Yes), BranchTarget::Ambiguous);
        assert_eq!(node.target(Branch::No), BranchTarget::Missing);
    }

    #[test]
    fn test_terminal_without_base_level() {
        let null: TerminalResult =
            serde_json::from_str(r#"{"baseLevel": null, "description": "Unclear"}"#).unwrap();
        let absent: TerminalResult = serde_json::from_str(r#"{"description": "Unclear"}"#).unwrap();
        assert_eq!(null, absent);
        assert_eq!(absent.base_level, None);
        assert_eq!(
            serde_json::to_value(&absent).unwrap(),
            serde_json::json!({ "description": "Unclear" })
        );
    }

    #[test]
    fn test_soc_unknown_type_survives() {
        let json = serde_json::json!({ "id": "soc_x", "type": "range" });
        let soc: SpecificOffenseCharacteristic = serde_json::from_value(json).unwrap();
        assert_eq!(soc.kind.as_deref(), Some("range"));
        assert_eq!(soc.soc_kind(), None);
    }
}
