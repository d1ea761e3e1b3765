//! Error types for the guidelines parser.
//!
//! Structural problems in interpreted rules are not errors: they are reported
//! as [`ValidationIssue`](crate::validator::ValidationIssue) values. Everything
//! here aborts the operation that produced it.

use thiserror::Error;

/// Main error type for the parser library.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Invalid section identifier format.
    #[error("Invalid section identifier: '{0}'. Expected e.g. 2K2.1 or 2B1.10")]
    InvalidSectionId(String),

    /// Invalid chapter prefix format.
    #[error("Invalid chapter: '{0}'. Expected a digit followed by a letter (e.g., 2K)")]
    InvalidChapter(String),

    /// Requested section is absent from the section map.
    #[error("Section {0} not found in the corpus")]
    SectionNotFound(String),

    /// No section of the requested chapter was found.
    #[error("No sections found for chapter {0}")]
    NoSectionsInChapter(String),

    /// A document id has no backing file.
    #[error("Document {doc} not found in the corpus")]
    DocumentMissing { doc: u32 },

    /// A document exists but its text could not be extracted.
    #[error("Failed to read document {doc}: {message}")]
    DocumentRead { doc: u32, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request to the interpretation service failed.
    #[error("LLM API request failed: {0}")]
    LlmApiRequest(#[from] reqwest::Error),

    /// Interpretation service answered with an error status.
    #[error("LLM API error (status {status}): {message}")]
    LlmApiError { status: u16, message: String },

    /// Interpretation service is rate limiting us.
    #[error("LLM rate limited, retry after {retry_after_secs}s")]
    LlmRateLimited { retry_after_secs: u64 },

    /// Interpretation service returned no text.
    #[error("LLM returned empty response")]
    LlmEmptyResponse,

    /// Interpretation response held no usable JSON.
    #[error("Failed to parse interpretation response: {0}")]
    InterpretationParse(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParserError {
    /// Whether this error came from calling the interpretation service.
    #[must_use]
    pub fn is_interpretation_call(&self) -> bool {
        matches!(
            self,
            Self::LlmApiRequest(_)
                | Self::LlmApiError { .. }
                | Self::LlmRateLimited { .. }
                | Self::LlmEmptyResponse
        )
    }
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;
