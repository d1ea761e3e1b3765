//! Orchestration of the per-section pipeline.
//!
//! A section moves through [`SectionStage`]s in order. Persisting is left to
//! the caller (see [`crate::output`]) so that section and chapter runs can
//! choose between merging and truncating.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, error, info, warn};

use crate::config::validate_chapter;
use crate::corpus::PageCorpus;
use crate::error::{ParserError, Result};
use crate::extractor::{ExtractLimits, TextExtractor};
use crate::header::HeaderPolicy;
use crate::interpret::Interpreter;
use crate::mapper::{SectionMap, SectionMapper};
use crate::types::{ExtractedText, SectionId, SectionLocation, SectionRules};
use crate::validator::{validate_rules, ValidationIssue};

/// Pipeline stage of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SectionStage {
    Located,
    Extracted,
    Segmented,
    Interpreted,
    Validated,
    Persisted,
}

impl fmt::Display for SectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Located => "located",
            Self::Extracted => "extracted",
            Self::Segmented => "segmented",
            Self::Interpreted => "interpreted",
            Self::Validated => "validated",
            Self::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Result of running one section.
#[derive(Debug, Clone)]
pub enum SectionOutcome {
    /// Dry run: extraction only.
    DryRun(ExtractedText),
    /// Interpreted and validated rules, ready to persist.
    Parsed {
        rules: SectionRules,
        issues: Vec<ValidationIssue>,
    },
}

/// A section that could not be parsed during a chapter run.
#[derive(Debug)]
pub struct SectionFailure {
    pub section: SectionId,
    /// Stage that was being entered when the error occurred.
    pub stage: SectionStage,
    pub error: ParserError,
}

/// Outcome of a chapter run.
#[derive(Debug, Default)]
pub struct ChapterReport {
    /// Parsed sections keyed by identifier.
    pub sections: BTreeMap<String, SectionRules>,
    /// Validation findings of parsed sections, only where non-empty.
    pub issues: BTreeMap<String, Vec<ValidationIssue>>,
    pub failures: Vec<SectionFailure>,
    pub dry_runs: Vec<ExtractedText>,
}

impl ChapterReport {
    /// Total number of validation findings.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }
}

/// Drives mapping, extraction, interpretation and validation.
pub struct GuidelinesParser<P: PageCorpus, I: Interpreter> {
    corpus: P,
    policy: HeaderPolicy,
    limits: ExtractLimits,
    interpreter: Option<I>,
    sections: OnceCell<SectionMap>,
}

impl<P: PageCorpus, I: Interpreter> GuidelinesParser<P, I> {
    /// Parser without an interpreter; only scans and dry runs succeed.
    pub fn new(corpus: P) -> Self {
        Self {
            corpus,
            policy: HeaderPolicy::default(),
            limits: ExtractLimits::default(),
            interpreter: None,
            sections: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_interpreter(mut self, interpreter: I) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: HeaderPolicy) -> Self {
        self.policy = policy;
        self.sections = OnceCell::new();
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: ExtractLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Section map, scanned on first use.
    pub fn scan_sections(&self) -> &SectionMap {
        self.sections
            .get_or_init(|| SectionMapper::scan_all(&self.corpus, &self.policy))
    }

    /// Extract the text of one section without interpreting it.
    pub fn extract(&self, section: &SectionId) -> Result<ExtractedText> {
        let location = self.locate(section)?;
        Ok(self.extractor().extract_section(location))
    }

    /// Run one section. Errors propagate.
    pub fn parse_section(&self, section: &SectionId, dry_run: bool) -> Result<SectionOutcome> {
        let location = self.locate(section)?;
        self.run(location, dry_run).map_err(|failure| failure.error)
    }

    /// Run every section of `chapter` (e.g. `2K`) in natural order.
    ///
    /// A failing section is logged and recorded; the rest still run.
    pub fn parse_chapter(&self, chapter: &str, dry_run: bool) -> Result<ChapterReport> {
        validate_chapter(chapter)?;

        let locations = self.scan_sections().chapter_sections(chapter);
        if locations.is_empty() {
            return Err(ParserError::NoSectionsInChapter(chapter.to_string()));
        }
        info!(chapter, sections = locations.len(), dry_run, "parsing chapter");

        let mut report = ChapterReport::default();
        for location in locations {
            match self.run(location, dry_run) {
                Ok(SectionOutcome::DryRun(extracted)) => report.dry_runs.push(extracted),
                Ok(SectionOutcome::Parsed { rules, issues }) => {
                    let key = location.section.to_string();
                    if !issues.is_empty() {
                        report.issues.insert(key.clone(), issues);
                    }
                    report.sections.insert(key, rules);
                }
                Err(failure) => {
                    error!(
                        section = %failure.section,
                        stage = %failure.stage,
                        error = %failure.error,
                        "section failed"
                    );
                    report.failures.push(failure);
                }
            }
        }

        info!(
            chapter,
            parsed = report.sections.len(),
            failed = report.failures.len(),
            "chapter done"
        );
        Ok(report)
    }

    fn locate(&self, section: &SectionId) -> Result<&SectionLocation> {
        self.scan_sections()
            .get(section)
            .ok_or_else(|| ParserError::SectionNotFound(section.to_string()))
    }

    fn extractor(&self) -> TextExtractor<'_, P> {
        TextExtractor::new(&self.corpus, &self.policy).with_limits(self.limits)
    }

    fn run(
        &self,
        location: &SectionLocation,
        dry_run: bool,
    ) -> std::result::Result<SectionOutcome, SectionFailure> {
        let section = &location.section;
        let fail = |stage: SectionStage, error: ParserError| SectionFailure {
            section: section.clone(),
            stage,
            error,
        };
        debug!(%section, stage = %SectionStage::Located, start = %location.start);

        let extracted = self.extractor().extract_section(location);
        debug!(%section, stage = %SectionStage::Segmented,
            full = extracted.full_text.len(),
            base = extracted.base_offense_text.len(),
            soc = extracted.soc_text.len(),
            cross_reference = extracted.cross_reference_text.len());

        if dry_run {
            return Ok(SectionOutcome::DryRun(extracted));
        }

        let interpreter = self.interpreter.as_ref().ok_or_else(|| {
            fail(
                SectionStage::Interpreted,
                ParserError::Config("no interpreter configured".into()),
            )
        })?;

        let base_offense_questions = interpreter
            .interpret_base_offense(&extracted.base_offense_text, section)
            .map_err(|e| fail(SectionStage::Interpreted, e))?;

        let specific_offense_characteristics = if extracted.soc_text.is_empty() {
            debug!(%section, "no specific offense characteristics text");
            Vec::new()
        } else {
            interpreter
                .interpret_soc(&extracted.soc_text, section)
                .map_err(|e| fail(SectionStage::Interpreted, e))?
        };

        let rules = SectionRules {
            title: extracted.title,
            section: section.to_string(),
            pdf_reference: extracted.pdf_reference,
            base_offense_questions,
            specific_offense_characteristics,
        };

        let issues = validate_rules(&rules);
        for issue in &issues {
            warn!(%section, stage = %SectionStage::Validated, "{issue}");
        }

        Ok(SectionOutcome::Parsed { rules, issues })
    }
}
