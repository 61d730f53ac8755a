//! Core library for delivery-note archiving.
//!
//! This crate provides:
//! - PDF text-layer extraction
//! - Client / site / equipment extraction from delivery-note text
//! - Month-code folders and archive path resolution
//! - The archival ledger, grouped archive views and invoice bundling
//! - Confined read access to archived PDFs

pub mod archive;
pub mod calendar;
pub mod error;
pub mod extract;
pub mod models;
pub mod naming;
pub mod pdf;
pub mod service;

pub use archive::{
    ArchivalLedger, ArchiveGrouping, ArchiveIndex, ArchiveLayout, ArchivePathResolver,
    BundleOutcome, InvoiceBundler, LedgerRecord, PurchaseOrder, SecureFileLocator,
};
pub use calendar::MonthCode;
pub use error::{AccessError, ArchiveError, PdfError, Result, ValidationError};
pub use extract::FieldExtractor;
pub use models::{ArchibonConfig, DocumentRef, ExtractedFields, GroupKey};
pub use naming::sanitize;
pub use pdf::{PdfExtractor, PdfProcessor, PdfTextSource, PdfType, TextSource};
pub use service::{
    Analysis, ArchiveRequest, ArchivedDocument, Archiver, InvoiceView, MonthListing,
    UploadHandle, UploadSource,
};
