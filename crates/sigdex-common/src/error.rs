//! Error types for sigdex.

use thiserror::Error;

/// Result type alias using SigdexError.
pub type Result<T> = std::result::Result<T, SigdexError>;

/// Errors that can occur in sigdex operations.
#[derive(Debug, Error)]
pub enum SigdexError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Paged file errors
    #[error("Page {page} out of bounds (file has {npages} pages)")]
    PageOutOfBounds { page: u32, npages: u32 },

    #[error("Page full, unable to add item")]
    PageFull,

    // Relation errors
    #[error("Relation already exists: {0}")]
    RelationExists(String),

    #[error("Relation corrupted: {0}")]
    RelationCorrupted(String),

    #[error("Relation full: bit-slice width allows at most {max_pages} data pages")]
    RelationFull { max_pages: u32 },

    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },

    // Insert errors
    #[error("Tuple has {actual} attributes, relation has {expected}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Tuple encodes to {size} bytes, fixed tuple size is {max}")]
    TupleTooLarge { size: usize, max: usize },

    // Query errors
    #[error("Query has {actual} attributes, relation has {expected}")]
    InvalidQuery { expected: usize, actual: usize },
}
