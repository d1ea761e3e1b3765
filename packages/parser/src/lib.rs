//! USSG Parser - Convert U.S. Sentencing Guidelines Chapter 2 PDFs into
//! validated decision-tree JSON.
//!
//! The corpus is a directory of `GLMFull <n>.pdf` files, each holding a
//! handful of pages of the Guidelines Manual. Parsing locates every Chapter 2
//! section header, extracts the text belonging to each section, splits it into
//! base offense, specific offense characteristics and cross reference regions,
//! asks a language model to structure the first two, and checks the result.
//!
//! # Example
//!
//! ```
//! use ussg_parser::config;
//!
//! // Validate section identifiers and chapters
//! assert!(config::validate_section_id("2K2.1").is_ok());
//! assert!(config::validate_chapter("2K").is_ok());
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration constants and validation
//! - [`types`]: Core data types (SectionId, DecisionNode, SectionRules, etc.)
//! - [`error`]: Error types and Result alias
//! - [`text`]: Page text normalization
//! - [`corpus`]: PDF and in-memory page sources
//! - [`header`]: Section header detection policy
//! - [`mapper`]: Single-pass section mapping
//! - [`extractor`]: Boundary-aware section text extraction
//! - [`segment`]: Splitting section text into regions
//! - [`interpret`]: LLM client and interpreter
//! - [`validator`]: Structural checks on interpreted rules
//! - [`parser`]: Per-section and per-chapter orchestration
//! - [`output`]: JSON output files
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extractor;
pub mod header;
pub mod interpret;
pub mod mapper;
pub mod output;
pub mod parser;
pub mod segment;
pub mod text;
pub mod types;
pub mod validator;

// Re-export commonly used items
pub use config::{validate_chapter, validate_section_id};
pub use corpus::{MemoryCorpus, PageCorpus, PdfCorpus};
pub use error::{ParserError, Result};
pub use header::HeaderPolicy;
pub use interpret::{Interpreter, LlmInterpreter};
pub use mapper::{SectionMap, SectionMapper};
pub use parser::{ChapterReport, GuidelinesParser, SectionOutcome, SectionStage};
pub use types::{
    DecisionNode, ExtractedText, SectionId, SectionLocation, SectionRules,
    SpecificOffenseCharacteristic,
};
pub use validator::{validate, ValidationIssue};
