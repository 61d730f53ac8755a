//! The archive tree: where documents go, what was recorded, and how they are
//! read back.

pub mod bundle;
pub mod index;
pub mod layout;
pub mod ledger;
pub mod locator;
pub mod resolver;

pub use bundle::{BundleOutcome, InvoiceBundler, PurchaseOrder};
pub use index::{ArchiveGrouping, ArchiveIndex, DatedDocument};
pub use layout::ArchiveLayout;
pub use ledger::{ArchivalLedger, LedgerRecord};
pub use locator::{PdfDocument, SecureFileLocator, PDF_CONTENT_TYPE};
pub use resolver::{parse_reference_date, ArchivePath, ArchivePathResolver};
