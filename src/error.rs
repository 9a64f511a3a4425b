//! Error types for the contouring pipeline.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ContourError>;

/// Errors that can occur while building or contouring a gridded field.
///
/// Degenerate rings and polygons are not errors: the tracer and the
/// assembler drop them and carry on with the rest of the field.
#[derive(Error, Debug)]
pub enum ContourError {
    /// No finite value exists to derive contour levels from.
    #[error("no valid data available for contouring")]
    EmptyInput,

    /// Co-registered swell quantities do not share one valid time.
    #[error(
        "mismatched valid times between fields (height {height}, period {period}, direction {direction})"
    )]
    TimestampMismatch {
        height: DateTime<Utc>,
        period: DateTime<Utc>,
        direction: DateTime<Utc>,
    },

    /// A required quantity is absent from a decoded document.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// An array does not match the grid shape.
    #[error("{array} has {actual} values, expected {expected} ({rows}x{cols} grid)")]
    ShapeMismatch {
        array: &'static str,
        actual: usize,
        expected: usize,
        rows: usize,
        cols: usize,
    },

    /// Fewer than 2 rows or columns.
    #[error("grid must be at least 2x2, got {rows}x{cols}")]
    GridTooSmall { rows: usize, cols: usize },

    /// A level set or level derivation parameter is unusable.
    #[error("invalid contour levels: {0}")]
    InvalidLevels(String),

    /// Filesystem error while reading or writing documents.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ContourError {
    /// Create an InvalidLevels error.
    pub fn invalid_levels(msg: impl Into<String>) -> Self {
        Self::InvalidLevels(msg.into())
    }

    /// Create a MissingField error.
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField(name.into())
    }

}
