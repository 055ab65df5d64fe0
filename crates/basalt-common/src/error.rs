//! Error types for BasaltDB.

use crate::page::PageId;
use thiserror::Error;

/// Result type alias using BasaltError.
pub type Result<T> = std::result::Result<T, BasaltError>;

/// Errors that can occur in BasaltDB operations.
///
/// Failures surface synchronously at the call site; no layer retries
/// internally.
#[derive(Debug, Error)]
pub enum BasaltError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Page format errors
    #[error("Page not found: {page_id}")]
    PageNotFound { page_id: PageId },

    #[error("Page corrupted: {page_id}, reason: {reason}")]
    PageCorrupted { page_id: PageId, reason: String },

    #[error("Page size mismatch: expected {expected}, got {actual}")]
    PageSizeMismatch { expected: usize, actual: usize },

    #[error("Field parse failed: {0}")]
    FieldParse(String),

    // Schema errors
    #[error("Schema mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("Field {index} is not set")]
    IncompleteTuple { index: usize },

    // Capacity errors
    #[error("Page full: {page_id}")]
    PageFull { page_id: PageId },

    #[error("Tuple too large: {tuple_size} bytes cannot fit in a {page_size}-byte page")]
    TupleTooLarge { tuple_size: usize, page_size: usize },

    // Lookup errors
    #[error("Tuple not found: {0}")]
    TupleNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table id not found: {0}")]
    TableIdNotFound(u32),

    #[error("Field index out of range: {index}")]
    FieldNotFound { index: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Scan has no more tuples")]
    ScanExhausted,

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
