//! Error types for the financial research agent

use thiserror::Error;

/// Result type alias for research operations
pub type Result<T> = std::result::Result<T, ResearchError>;

#[derive(Error, Debug)]
pub enum ResearchError {
    // =============================
    // Table Pipeline Errors
    // =============================

    /// A collected table region could not be parsed. Recoverable: the
    /// extractor downgrades this to a warning and keeps scanning.
    #[error("Couldn't parse table: {0}")]
    RegionParse(String),

    #[error("Export error: {0}")]
    Export(String),

    // =============================
    // Request / Upstream Errors
    // =============================

    #[error("Agent call failed: {0}")]
    Upstream(String),

    #[error("Please enter your Groq API key to continue")]
    MissingApiKey,

    #[error("Please enter a financial question before clicking Analyze")]
    EmptyQuery,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
