//! Page corpus access.
//!
//! The corpus is an ordered set of fixed-size documents addressed by 1-indexed
//! ids. PDF text extraction is delegated to `pdf-extract`; this module only
//! locates documents and normalizes their page text.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{pdf_file_name, pdf_reference, PDF_FILE_STEM};
use crate::error::{ParserError, Result};
use crate::text::normalize_page_text;

/// One page of a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Extracted text; `None` when the page has no text layer.
    pub text: Option<String>,
}

impl Page {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// Page text, empty when the page has none.
    #[must_use]
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// A loaded document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub id: u32,
    pub pages: Vec<Page>,
}

impl Document {
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Ordered, read-only source of document pages.
pub trait PageCorpus {
    /// All document ids in reading order.
    fn document_ids(&self) -> Vec<u32>;

    /// Load one document. Missing or unreadable documents are errors the
    /// caller is expected to log and skip.
    fn load(&self, doc: u32) -> Result<Document>;

    /// Reference recorded in the output for a document.
    fn reference(&self, doc: u32) -> String {
        format!("document {doc}")
    }
}

/// File name pattern of corpus documents: `GLMFull <n>.pdf`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PDF_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{PDF_FILE_STEM} (\d+)\.pdf$")).expect("valid regex")
});

/// Directory of `GLMFull <n>.pdf` files.
#[derive(Debug, Clone)]
pub struct PdfCorpus {
    dir: PathBuf,
}

impl PdfCorpus {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, doc: u32) -> PathBuf {
        self.dir.join(pdf_file_name(doc))
    }
}

impl PageCorpus for PdfCorpus {
    fn document_ids(&self) -> Vec<u32> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "cannot list corpus directory");
                return Vec::new();
            }
        };

        let ids: BTreeSet<u32> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                PDF_NAME_PATTERN
                    .captures(name)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse().ok())
            })
            .collect();

        ids.into_iter().collect()
    }

    fn load(&self, doc: u32) -> Result<Document> {
        let path = self.path_for(doc);
        if !path.is_file() {
            return Err(ParserError::DocumentMissing { doc });
        }

        let bytes = fs::read(&path)?;
        // pdf_extract can panic on malformed PDFs
        let extracted = std::panic::catch_unwind(|| {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        });
        let page_texts = match extracted {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                return Err(ParserError::DocumentRead {
                    doc,
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ParserError::DocumentRead {
                    doc,
                    message: "PDF extraction panicked (malformed PDF)".to_string(),
                })
            }
        };

        let pages = page_texts
            .into_iter()
            .map(|text| Page::from_text(normalize_page_text(&text)))
            .collect();

        Ok(Document { id: doc, pages })
    }

    fn reference(&self, doc: u32) -> String {
        pdf_reference(doc)
    }
}

/// In-memory corpus of already extracted pages.
///
/// Documents are numbered from 1 in insertion order, skipping ids marked
/// unreadable.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    documents: BTreeMap<u32, Vec<Page>>,
    unreadable: BTreeSet<u32>,
}

impl MemoryCorpus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document made of the given page texts.
    #[must_use]
    pub fn with_document<S: AsRef<str>>(mut self, pages: &[S]) -> Self {
        let id = self
            .documents
            .keys()
            .chain(self.unreadable.iter())
            .max()
            .map_or(1, |last| last + 1);
        let pages = pages
            .iter()
            .map(|text| Page::from_text(normalize_page_text(text.as_ref())))
            .collect();
        self.documents.insert(id, pages);
        self
    }

    /// Mark a document id as present but unreadable.
    #[must_use]
    pub fn with_unreadable(mut self, doc: u32) -> Self {
        self.unreadable.insert(doc);
        self
    }
}

impl PageCorpus for MemoryCorpus {
    fn document_ids(&self) -> Vec<u32> {
        self.documents
            .keys()
            .chain(self.unreadable.iter())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn load(&self, doc: u32) -> Result<Document> {
        if self.unreadable.contains(&doc) {
            return Err(ParserError::DocumentRead {
                doc,
                message: "unreadable document".to_string(),
            });
        }
        self.documents
            .get(&doc)
            .map(|pages| Document {
                id: doc,
                pages: pages.clone(),
            })
            .ok_or(ParserError::DocumentMissing { doc })
    }

    fn reference(&self, doc: u32) -> String {
        pdf_reference(doc)
    }
}
