//! Section mapping: one forward pass over the corpus recording where each
//! section starts and ends.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::corpus::PageCorpus;
use crate::header::{Header, HeaderPolicy};
use crate::types::{PagePosition, SectionId, SectionLocation};

/// Sections in discovery order with lookup by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    locations: Vec<SectionLocation>,
    index: HashMap<SectionId, usize>,
}

impl SectionMap {
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    #[must_use]
    pub fn get(&self, section: &SectionId) -> Option<&SectionLocation> {
        self.index.get(section).map(|&i| &self.locations[i])
    }

    #[must_use]
    pub fn contains(&self, section: &SectionId) -> bool {
        self.index.contains_key(section)
    }

    /// Locations in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &SectionLocation> {
        self.locations.iter()
    }

    /// Sections whose identifier starts with `prefix`, in natural order.
    #[must_use]
    pub fn chapter_sections(&self, prefix: &str) -> Vec<&SectionLocation> {
        let mut sections: Vec<&SectionLocation> = self
            .locations
            .iter()
            .filter(|loc| loc.section.as_str().starts_with(prefix))
            .collect();
        sections.sort_by(|a, b| a.section.cmp(&b.section));
        sections
    }

    /// Locations grouped by two-character chapter, each group in natural order.
    #[must_use]
    pub fn by_chapter(&self) -> BTreeMap<String, Vec<&SectionLocation>> {
        let mut chapters: BTreeMap<String, Vec<&SectionLocation>> = BTreeMap::new();
        for loc in &self.locations {
            chapters
                .entry(loc.section.chapter().to_string())
                .or_default()
                .push(loc);
        }
        for sections in chapters.values_mut() {
            sections.sort_by(|a, b| a.section.cmp(&b.section));
        }
        chapters
    }

    fn insert(&mut self, location: SectionLocation) {
        self.index
            .insert(location.section.clone(), self.locations.len());
        self.locations.push(location);
    }

    fn close(&mut self, section: &SectionId, end: PagePosition) {
        if let Some(&i) = self.index.get(section) {
            let loc = &mut self.locations[i];
            if loc.end.is_none() {
                loc.end = Some(end);
            }
        }
    }
}

/// Scanner state: whether a section is currently open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Open(SectionId),
}

/// Builds a [`SectionMap`] from header occurrences.
///
/// Headers are fed in corpus order through [`SectionMapper::observe`], which
/// performs the close-previous/open-next transition as one step.
#[derive(Debug)]
pub struct SectionMapper {
    policy: HeaderPolicy,
    state: ScanState,
    sections: SectionMap,
}

impl SectionMapper {
    pub fn new(policy: HeaderPolicy) -> Self {
        Self {
            policy,
            state: ScanState::Idle,
            sections: SectionMap::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Apply one header found at `position`.
    ///
    /// - a header of the open section is ignored
    /// - a first occurrence closes the open section and opens the new one
    /// - a repeat of an earlier section closes the open one and leaves no
    ///   section open; the first occurrence keeps its location
    pub fn observe(&mut self, header: Header, position: PagePosition) {
        if let ScanState::Open(open) = &self.state {
            if open == &header.section {
                return;
            }
            let open = open.clone();
            self.sections.close(&open, position);
            self.state = ScanState::Idle;
        }

        if self.sections.contains(&header.section) {
            debug!(section = %header.section, %position, "ignoring repeated header");
            return;
        }

        info!(section = %header.section, %position, title = %header.title, "found section");
        self.sections.insert(SectionLocation {
            section: header.section.clone(),
            title: header.title,
            start: position,
            end: None,
        });
        self.state = ScanState::Open(header.section);
    }

    /// Finish the scan. A still-open section stays unterminated.
    pub fn finish(self) -> SectionMap {
        self.sections
    }

    /// Scan every document of the corpus with the given policy.
    ///
    /// Documents that cannot be read are logged and skipped.
    pub fn scan_all<C: PageCorpus + ?Sized>(corpus: &C, policy: &HeaderPolicy) -> SectionMap {
        let mut mapper = Self::new(policy.clone());
        let doc_ids = corpus.document_ids();
        info!(documents = doc_ids.len(), "scanning corpus");

        for doc in doc_ids {
            let document = match corpus.load(doc) {
                Ok(document) => document,
                Err(e) => {
                    warn!(doc, error = %e, "skipping unreadable document");
                    continue;
                }
            };

            for (page, content) in document.pages.iter().enumerate() {
                for header in mapper.policy.find_headers(content.text_or_empty()) {
                    mapper.observe(header, PagePosition::new(doc, page));
                }
            }
        }

        mapper.finish()
    }
}
