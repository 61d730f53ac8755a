//! Error types for the archibon-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the archibon library.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Caller-supplied input was rejected before anything was written.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A read-back request was refused.
    #[error("access denied: {0}")]
    Access(#[from] AccessError),

    /// Ledger read/write error.
    #[error("ledger error: {0}")]
    Ledger(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Rejected operator input. Nothing is written when one of these is returned.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// One of client, site or equipment is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field that cannot be used as a folder name (`.` or `..`).
    #[error("invalid value for field: {0}")]
    InvalidField(&'static str),

    /// The deployment requires a reference date and none was given.
    #[error("a reference date is required")]
    MissingReferenceDate,

    /// The reference date is not a `YYYY-MM-DD` date.
    #[error("invalid reference date: {0:?}")]
    InvalidReferenceDate(String),

    /// The reference date cannot be encoded as a month code.
    #[error("reference date out of range: {0}")]
    ReferenceDateOutOfRange(String),

    /// The invoice name is empty once sanitized.
    #[error("invoice name is empty")]
    EmptyInvoiceName,

    /// Only PDF uploads are accepted.
    #[error("unsupported upload: {0}")]
    UnsupportedUpload(String),

    /// The upload handle does not refer to a staged document.
    #[error("unknown upload: {0}")]
    UnknownUpload(String),

    /// Neither document bytes nor a staged upload were supplied.
    #[error("no document supplied")]
    NoDocument,
}

/// Errors returned when serving an archived file back to a caller.
#[derive(Error, Debug)]
pub enum AccessError {
    /// Not an existing PDF file.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Exists, but lies outside the archive root.
    #[error("forbidden path: {}", .0.display())]
    Forbidden(PathBuf),
}

/// Result type for the archibon library.
pub type Result<T> = std::result::Result<T, ArchiveError>;
