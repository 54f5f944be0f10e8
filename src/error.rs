use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur while an
/// inventory export is normalised, grouped, and assembled into a sizer request.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the inventory workbook lacks the sheet a format expects.
    #[error("schema mismatch: missing sheet '{0}'")]
    MissingSheet(String),

    /// Raised when required source columns are absent. Lists every missing
    /// column, not only the first one found.
    #[error("schema mismatch: sheet '{sheet}' is missing columns {columns:?}")]
    MissingColumns { sheet: String, columns: Vec<String> },

    /// Raised when a numeric field holds a value that cannot be coerced.
    #[error("invalid numeric value '{value}' in column '{column}' of sheet '{sheet}' (row {row})")]
    NumericCoercion {
        sheet: String,
        row: usize,
        column: String,
        value: String,
    },

    /// Raised when the grouping selector is not one of the known dimensions.
    #[error("unrecognized grouping dimension '{0}'")]
    UnrecognizedGroupingDimension(String),

    /// Raised when a staged group cannot be loaded back.
    #[error("failed to read group artifact '{name}': {reason}")]
    ArtifactRead { name: String, reason: String },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
