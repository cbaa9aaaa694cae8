use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the fatal failures of a conversion run.
///
/// Per-subject problems in the variable tables are not errors; they are
/// reported through [`crate::variables::SheetAttempt`] and logged.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the JSON sidecar cannot be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the tab-separated writer.
    #[error("TSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the two sheets of a reference workbook disagree on the
    /// region layout.
    #[error("reference layout mismatch for {modality}: {detail}")]
    LayoutMismatch { modality: String, detail: String },

    /// Raised when a row does not have as many cells as the table header.
    #[error("row has {found} cells but the table has {expected} columns")]
    RaggedRow { expected: usize, found: usize },

    /// Raised when a required input file does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
