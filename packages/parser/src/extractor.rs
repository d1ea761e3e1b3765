//! Section text extraction with boundary detection.

use tracing::{debug, warn};

use crate::config::{MAX_SECTION_DOCUMENTS, OPEN_END_LOOKAHEAD};
use crate::corpus::PageCorpus;
use crate::header::HeaderPolicy;
use crate::segment::segment;
use crate::types::{ExtractedText, SectionLocation};

/// Caps on how far extraction reads past a section's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    /// Further documents read when the end is unknown.
    pub open_end_lookahead: u32,
    /// Documents read at most, start document included.
    pub max_documents: u32,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            open_end_lookahead: OPEN_END_LOOKAHEAD,
            max_documents: MAX_SECTION_DOCUMENTS,
        }
    }
}

impl ExtractLimits {
    /// Last document id to read for `location`.
    #[must_use]
    pub fn last_document(&self, location: &SectionLocation) -> u32 {
        let start = location.start.doc;
        let wanted = match location.end {
            Some(end) => end.doc,
            None => start.saturating_add(self.open_end_lookahead),
        };
        let cap = start.saturating_add(self.max_documents.saturating_sub(1));
        wanted.min(cap)
    }
}

/// Reads the text of one section out of the corpus.
#[derive(Debug)]
pub struct TextExtractor<'a, C: PageCorpus + ?Sized> {
    corpus: &'a C,
    policy: &'a HeaderPolicy,
    /// Same filters as `policy` but for every chapter, so the first
    /// header of the next chapter ends the last section of this one.
    boundaries: HeaderPolicy,
    limits: ExtractLimits,
}

impl<'a, C: PageCorpus + ?Sized> TextExtractor<'a, C> {
    pub fn new(corpus: &'a C, policy: &'a HeaderPolicy) -> Self {
        Self {
            corpus,
            policy,
            boundaries: policy.clone().all_chapters(),
            limits: ExtractLimits::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: ExtractLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Extract and segment the text of `location`.
    ///
    /// Reading stops at the first header of another section, at the end
    /// location, or at the document cap, whichever comes first. Text before
    /// the section's own header on the start page is dropped.
    pub fn extract_section(&self, location: &SectionLocation) -> ExtractedText {
        let full_text = self.read_span(location);
        let segments = segment(&full_text);

        ExtractedText {
            section: location.section.clone(),
            title: location.title.clone(),
            base_offense_text: segments.base.text.to_string(),
            soc_text: segments.soc.text.to_string(),
            cross_reference_text: segments.cross_reference.text.to_string(),
            full_text,
            pdf_reference: self.corpus.reference(location.start.doc),
        }
    }

    fn read_span(&self, location: &SectionLocation) -> String {
        let section = &location.section;
        let first_doc = location.start.doc;
        let last_doc = self.limits.last_document(location);
        let mut texts: Vec<String> = Vec::new();

        let doc_ids = self
            .corpus
            .document_ids()
            .into_iter()
            .filter(|doc| (first_doc..=last_doc).contains(doc));

        'documents: for doc in doc_ids {
            let document = match self.corpus.load(doc) {
                Ok(document) => document,
                Err(e) => {
                    warn!(%section, doc, error = %e, "skipping document during extraction");
                    continue;
                }
            };

            for (page, content) in document.pages.iter().enumerate() {
                if doc == first_doc && page < location.start.page {
                    continue;
                }

                let text = content.text_or_empty();
                let mut from = 0;
                if doc == first_doc && page == location.start.page {
                    if let Some(own) = self.policy.find_own_header(text, section) {
                        from = own.offset;
                    }
                }

                if let Some(next) = self.boundaries.find_foreign_header(text, section, from) {
                    debug!(%section, doc, page, next = %next.section, "section boundary");
                    texts.push(text[from..next.offset].to_string());
                    break 'documents;
                }

                texts.push(text[from..].to_string());

                if let Some(end) = location.end {
                    if doc == end.doc && page >= end.page {
                        break 'documents;
                    }
                }
            }
        }

        texts.join("\n")
    }
}
