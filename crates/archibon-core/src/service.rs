//! Operator-facing operations over one archive.
//!
//! [`Archiver`] ties extraction, path resolution, the ledger, the index, the
//! bundler and the locator together. Each call runs to completion and keeps
//! no state between calls: the analyze step hands back an [`UploadHandle`]
//! that the caller passes to [`Archiver::archive`] to confirm it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::archive::{
    parse_reference_date, ArchivalLedger, ArchiveGrouping, ArchiveIndex, ArchiveLayout,
    ArchivePathResolver, BundleOutcome, InvoiceBundler, LedgerRecord, PdfDocument,
    PurchaseOrder, SecureFileLocator,
};
use crate::calendar::MonthCode;
use crate::error::{Result, ValidationError};
use crate::extract::FieldExtractor;
use crate::models::config::ArchibonConfig;
use crate::models::document::ExtractedFields;
use crate::naming::sanitize;
use crate::pdf::{PdfTextSource, TextSource};

/// Reference to an analysed upload waiting in the staging area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadHandle(String);

impl UploadHandle {
    /// Wrap a handle received back from a caller. Checked when used.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && !self.0.contains(['/', '\\']) && !self.0.contains("..")
    }
}

impl std::fmt::Display for UploadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields proposed for an upload, awaiting operator confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub upload: UploadHandle,
    /// Staged file name.
    pub file_name: String,
    pub fields: ExtractedFields,
}

/// Where the document to archive comes from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Fresh upload.
    Bytes { file_name: String, data: Vec<u8> },
    /// Upload staged by a previous [`Archiver::analyze`] call.
    Staged(UploadHandle),
}

/// Operator-confirmed archival request.
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub fields: ExtractedFields,
    /// `YYYY-MM-DD`; `None` or blank for an undated archive.
    pub reference_date: Option<String>,
    pub source: UploadSource,
}

/// Result of a successful archival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivedDocument {
    pub path: PathBuf,
    pub record: LedgerRecord,
}

/// Grouping plus the month codes and clients available for filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceView {
    pub grouping: ArchiveGrouping,
    pub month_codes: Vec<MonthCode>,
    pub clients: Vec<String>,
}

/// Documents modified during one month, grouped by client, site and equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthListing {
    pub year: i32,
    pub month: u32,
    /// Display code, absent for years a month code cannot encode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_code: Option<MonthCode>,
    pub grouping: ArchiveGrouping,
}

/// The archive operations.
pub struct Archiver<S: TextSource = PdfTextSource> {
    layout: ArchiveLayout,
    source: S,
    extractor: FieldExtractor,
    require_reference_date: bool,
}

impl Archiver<PdfTextSource> {
    /// Archiver reading PDFs with the configured text-layer threshold.
    pub fn from_config(config: &ArchibonConfig) -> Self {
        Self::with_source(
            ArchiveLayout::from_settings(&config.archive),
            PdfTextSource::new(config.pdf.min_text_length),
        )
        .with_required_reference_date(config.classification.require_reference_date)
    }
}

impl<S: TextSource> Archiver<S> {
    pub fn with_source(layout: ArchiveLayout, source: S) -> Self {
        Self {
            layout,
            source,
            extractor: FieldExtractor::new(),
            require_reference_date: false,
        }
    }

    /// Refuse undated archivals.
    pub fn with_required_reference_date(mut self, required: bool) -> Self {
        self.require_reference_date = required;
        self
    }

    pub fn with_extractor(mut self, extractor: FieldExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    /// Extract fields from a document without staging it.
    pub fn extract_fields(&self, data: &[u8]) -> ExtractedFields {
        self.extractor.extract_document(&self.source, data)
    }

    /// Stage an upload and propose its fields.
    pub fn analyze(&self, file_name: &str, data: &[u8]) -> Result<Analysis> {
        let file_name = upload_name(file_name)?;
        if data.is_empty() {
            return Err(ValidationError::NoDocument.into());
        }
        self.layout.ensure()?;

        let (upload, dir) = self.new_staging_dir()?;
        fs::write(dir.join(&file_name), data)?;
        debug!("Staged {} as upload {}", file_name, upload);

        let fields = self.extract_fields(data);
        Ok(Analysis {
            upload,
            file_name,
            fields,
        })
    }

    /// Validate, write the document into the tree and record it in the ledger.
    ///
    /// Nothing is written unless every field is filled in and the reference
    /// date, when given, is valid.
    pub fn archive(&self, request: ArchiveRequest) -> Result<ArchivedDocument> {
        if let Some(missing) = request.fields.normalized().first_missing() {
            return Err(ValidationError::MissingField(missing).into());
        }

        let reference_date = match request.reference_date.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(parse_reference_date(text)?),
            _ => None,
        };

        let resolver = ArchivePathResolver::new(&self.layout)
            .with_required_reference_date(self.require_reference_date);
        // validate the date before loading anything
        resolver.plan(&request.fields, "", reference_date)?;

        let (file_name, data, staged) = match request.source {
            UploadSource::Bytes { file_name, data } => {
                if data.is_empty() {
                    return Err(ValidationError::NoDocument.into());
                }
                (upload_name(&file_name)?, data, None)
            }
            UploadSource::Staged(handle) => {
                let (file_name, data) = self.load_staged(&handle)?;
                (file_name, data, Some(handle))
            }
        };

        let target = resolver.resolve(&request.fields, &file_name, reference_date)?;
        let path = target.path();
        fs::write(&path, &data)?;

        let record = LedgerRecord::at(
            Local::now(),
            target.month_code.clone(),
            target.fields.client.as_str(),
            target.fields.site.as_str(),
            target.fields.equipment.as_str(),
            target.file_name.as_str(),
        );
        ArchivalLedger::new(self.layout.ledger_path()).append(&record)?;

        if let Some(handle) = staged {
            let dir = self.layout.staging_dir().join(handle.as_str());
            if let Err(e) = fs::remove_dir_all(&dir) {
                warn!("Could not clear staged upload {}: {}", dir.display(), e);
            }
        }

        info!("Archived {}", path.display());
        Ok(ArchivedDocument { path, record })
    }

    /// Current grouping filtered by month code and client. Blank filters are
    /// ignored.
    pub fn invoice_view(&self, month: Option<&str>, client: Option<&str>) -> Result<InvoiceView> {
        let grouping = ArchiveIndex::for_layout(&self.layout).scan()?;
        let month = month
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(MonthCode::from_folder);
        let client = client.map(str::trim).filter(|c| !c.is_empty());

        Ok(InvoiceView {
            month_codes: grouping.month_codes(),
            clients: grouping.clients(),
            grouping: grouping.filter(month.as_ref(), client),
        })
    }

    /// Move archived documents into an invoice folder.
    pub fn bundle(
        &self,
        invoice_name: &str,
        files: &[PathBuf],
        purchase_order: Option<&PurchaseOrder>,
    ) -> Result<BundleOutcome> {
        InvoiceBundler::new(&self.layout).bundle(invoice_name, files, purchase_order)
    }

    /// Documents modified during the month of a `YYYY-MM` or `YYYY-MM-DD`
    /// selection.
    pub fn month_listing(&self, selection: &str) -> Result<MonthListing> {
        let (year, month) = parse_month_selection(selection)?;
        let grouping = ArchiveIndex::for_layout(&self.layout)
            .scan_by_date(year, month)?
            .into_iter()
            .map(|dated| {
                let mut key = dated.key;
                key.month = None;
                (key, dated.document)
            })
            .collect();

        Ok(MonthListing {
            year,
            month,
            month_code: MonthCode::new(year, month),
            grouping,
        })
    }

    /// Open an archived PDF for reading.
    pub fn open_pdf(&self, requested: &str) -> Result<PdfDocument> {
        SecureFileLocator::new(self.layout.root()).resolve_for_read(requested)
    }

    /// Every ledger row, oldest first.
    pub fn history(&self) -> Result<Vec<LedgerRecord>> {
        ArchivalLedger::new(self.layout.ledger_path()).read_records()
    }

    fn new_staging_dir(&self) -> Result<(UploadHandle, PathBuf)> {
        let stamp = Local::now().format("%Y%m%d%H%M%S%f").to_string();
        let mut token = stamp.clone();
        let mut n = 1;
        loop {
            let dir = self.layout.staging_dir().join(&token);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok((UploadHandle(token), dir)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    token = format!("{stamp}-{n}");
                    n += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn load_staged(&self, handle: &UploadHandle) -> Result<(String, Vec<u8>)> {
        let unknown = || ValidationError::UnknownUpload(handle.to_string());
        if !handle.is_well_formed() {
            return Err(unknown().into());
        }

        let dir = self.layout.staging_dir().join(handle.as_str());
        let Ok(entries) = fs::read_dir(&dir) else {
            return Err(unknown().into());
        };
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let file_name = entry.file_name().to_string_lossy().into_owned();
                let data = fs::read(entry.path())?;
                return Ok((file_name, data));
            }
        }
        Err(unknown().into())
    }
}

// Final path component, sanitized; only PDFs are accepted
fn upload_name(name: &str) -> Result<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    let is_pdf = Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf || base.len() <= ".pdf".len() {
        return Err(ValidationError::UnsupportedUpload(name.to_string()).into());
    }
    Ok(sanitize(base))
}

fn parse_month_selection(text: &str) -> std::result::Result<(i32, u32), ValidationError> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d"))
        .map(|date| (date.year(), date.month()))
        .map_err(|_| ValidationError::InvalidReferenceDate(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AccessError, ArchiveError, PdfError};
    use crate::pdf;
    use pretty_assertions::assert_eq;

    /// Returns the same lines for every document.
    struct FakeSource(Vec<&'static str>);

    impl TextSource for FakeSource {
        fn extract_lines(&self, _data: &[u8]) -> pdf::Result<Vec<String>> {
            Ok(self.0.iter().map(|l| l.to_string()).collect())
        }
    }

    struct BrokenSource;

    impl TextSource for BrokenSource {
        fn extract_lines(&self, _data: &[u8]) -> pdf::Result<Vec<String>> {
            Err(PdfError::Parse("broken xref".to_string()))
        }
    }

    const NOTE: [&str; 4] = [
        "BON DE LIVRAISON",
        "Client: Acme",
        "Chantier: SiteA",
        "Materiel: Crane1",
    ];

    fn archiver(dir: &Path) -> Archiver<FakeSource> {
        Archiver::with_source(ArchiveLayout::new(dir.join("archive")), FakeSource(NOTE.to_vec()))
    }

    fn bytes(file_name: &str) -> UploadSource {
        UploadSource::Bytes {
            file_name: file_name.to_string(),
            data: b"%PDF-1.4 fake".to_vec(),
        }
    }

    #[test]
    fn test_analyze_stages_and_extracts() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path());

        let analysis = archiver.analyze("bl 42.pdf", b"%PDF-1.4 fake").unwrap();

        assert_eq!(analysis.fields, ExtractedFields::new("Acme", "SiteA", "Crane1"));
        assert_eq!(analysis.file_name, "bl 42.pdf");
        let staged = archiver
            .layout()
            .staging_dir()
            .join(analysis.upload.as_str())
            .join("bl 42.pdf");
        assert_eq!(fs::read(staged).unwrap(), b"%PDF-1.4 fake");
    }

    #[test]
    fn test_analyze_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let err = archiver(dir.path()).analyze("photo.jpg", b"data").unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Validation(ValidationError::UnsupportedUpload(_))
        ));
    }

    #[test]
    fn test_unreadable_document_yields_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = Archiver::with_source(ArchiveLayout::new(dir.path()), BrokenSource);

        let analysis = archiver.analyze("bl.pdf", b"garbage").unwrap();

        assert_eq!(analysis.fields, ExtractedFields::default());
    }

    #[test]
    fn test_archive_dated_document() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path());

        let archived = archiver
            .archive(ArchiveRequest {
                fields: ExtractedFields::new("Acme", "SiteA", "Crane1"),
                reference_date: Some("2025-10-15".to_string()),
                source: bytes("bl.pdf"),
            })
            .unwrap();

        let root = archiver.layout().root();
        assert_eq!(archived.path, root.join("oct25/Acme/SiteA/Crane1/Acme_SiteA_Crane1_bl.pdf"));
        assert!(archived.path.is_file());

        let history = archiver.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], archived.record);
        assert_eq!(history[0].month_code, MonthCode::new(2025, 10));
        assert_eq!(history[0].client, "Acme");
        assert_eq!(history[0].file_name, "Acme_SiteA_Crane1_bl.pdf");
    }

    #[test]
    fn test_archive_staged_upload_clears_staging() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path());
        let analysis = archiver.analyze("bl.pdf", b"%PDF-1.4 staged").unwrap();

        let archived = archiver
            .archive(ArchiveRequest {
                fields: analysis.fields.clone(),
                reference_date: None,
                source: UploadSource::Staged(analysis.upload.clone()),
            })
            .unwrap();

        assert_eq!(fs::read(&archived.path).unwrap(), b"%PDF-1.4 staged");
        assert_eq!(archived.record.month_code, None);
        assert!(!archiver
            .layout()
            .staging_dir()
            .join(analysis.upload.as_str())
            .exists());
    }

    #[test]
    fn test_missing_field_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path());

        let err = archiver
            .archive(ArchiveRequest {
                fields: ExtractedFields::new("Acme", "SiteA", ""),
                reference_date: Some("2025-10-15".to_string()),
                source: bytes("bl.pdf"),
            })
            .unwrap_err();

        assert!(matches!(
            err,
            ArchiveError::Validation(ValidationError::MissingField("equipment"))
        ));
        assert!(!archiver.layout().root().join("oct25").exists());
        assert!(!archiver.layout().ledger_path().exists());
    }

    #[test]
    fn test_dot_fields_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path());

        let err = archiver
            .archive(ArchiveRequest {
                fields: ExtractedFields::new("..", "..", "escaped"),
                reference_date: None,
                source: bytes("bl.pdf"),
            })
            .unwrap_err();

        assert!(matches!(
            err,
            ArchiveError::Validation(ValidationError::InvalidField("client"))
        ));
        assert!(!archiver.layout().root().exists());
        assert!(!archiver.layout().ledger_path().exists());
    }

    #[test]
    fn test_invalid_date_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path());

        let err = archiver
            .archive(ArchiveRequest {
                fields: ExtractedFields::new("Acme", "SiteA", "Crane1"),
                reference_date: Some("15/10/2025".to_string()),
                source: bytes("bl.pdf"),
            })
            .unwrap_err();

        assert!(matches!(
            err,
            ArchiveError::Validation(ValidationError::InvalidReferenceDate(_))
        ));
        assert!(archiver.history().unwrap().is_empty());
    }

    #[test]
    fn test_required_date() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path()).with_required_reference_date(true);

        let err = archiver
            .archive(ArchiveRequest {
                fields: ExtractedFields::new("Acme", "SiteA", "Crane1"),
                reference_date: Some("  ".to_string()),
                source: bytes("bl.pdf"),
            })
            .unwrap_err();

        assert!(matches!(
            err,
            ArchiveError::Validation(ValidationError::MissingReferenceDate)
        ));
    }

    #[test]
    fn test_unknown_upload_handles() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path());
        archiver.layout().ensure().unwrap();

        for token in ["20250101000000000000000", "../historique.csv", ""] {
            let err = archiver
                .archive(ArchiveRequest {
                    fields: ExtractedFields::new("Acme", "SiteA", "Crane1"),
                    reference_date: None,
                    source: UploadSource::Staged(UploadHandle::new(token)),
                })
                .unwrap_err();
            assert!(matches!(
                err,
                ArchiveError::Validation(ValidationError::UnknownUpload(_))
            ));
        }
    }

    #[test]
    fn test_invoice_view_and_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path());
        let request = |client: &str, date: &str, name: &str| ArchiveRequest {
            fields: ExtractedFields::new(client, "SiteA", "Crane1"),
            reference_date: Some(date.to_string()),
            source: bytes(name),
        };
        let first = archiver.archive(request("Acme", "2025-10-02", "a.pdf")).unwrap();
        archiver.archive(request("Acme", "2025-09-30", "b.pdf")).unwrap();
        archiver.archive(request("Beta", "2025-10-20", "c.pdf")).unwrap();

        let view = archiver.invoice_view(Some("oct25"), Some("Acme")).unwrap();
        let months: Vec<&str> = view.month_codes.iter().map(MonthCode::as_str).collect();
        assert_eq!(months, vec!["sept25", "oct25"]);
        assert_eq!(view.clients, vec!["Acme", "Beta"]);
        assert_eq!(view.grouping.document_count(), 1);

        let outcome = archiver.bundle("F-001", &[first.path.clone()], None).unwrap();
        assert_eq!(outcome.moved.len(), 1);

        let view = archiver.invoice_view(Some(""), None).unwrap();
        assert_eq!(view.grouping.document_count(), 2);
    }

    #[test]
    fn test_month_listing() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path());
        archiver
            .archive(ArchiveRequest {
                fields: ExtractedFields::new("Acme", "SiteA", "Crane1"),
                reference_date: Some("2025-10-15".to_string()),
                source: bytes("bl.pdf"),
            })
            .unwrap();

        let today = Local::now().date_naive();
        let listing = archiver
            .month_listing(&today.format("%Y-%m-%d").to_string())
            .unwrap();

        assert_eq!(listing.month_code, MonthCode::from_date(today));
        assert_eq!(listing.grouping.document_count(), 1);
        let (key, _) = listing.grouping.iter().next().unwrap();
        assert_eq!(key.month, None);
        assert_eq!(key.client, "Acme");

        let empty = archiver.month_listing("1999-01").unwrap();
        assert!(empty.grouping.is_empty());
        assert_eq!(empty.month_code, None);

        assert!(archiver.month_listing("octobre").is_err());
    }

    #[test]
    fn test_open_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let archiver = archiver(dir.path());
        let archived = archiver
            .archive(ArchiveRequest {
                fields: ExtractedFields::new("Acme", "SiteA", "Crane1"),
                reference_date: None,
                source: bytes("bl.pdf"),
            })
            .unwrap();

        let doc = archiver.open_pdf(archived.path.to_str().unwrap()).unwrap();
        assert_eq!(doc.content_type, "application/pdf");

        let err = archiver.open_pdf("../../etc/passwd.pdf").unwrap_err();
        assert!(matches!(err, ArchiveError::Access(AccessError::NotFound(_))));
    }

    #[test]
    fn test_parse_month_selection() {
        assert_eq!(parse_month_selection("2025-10"), Ok((2025, 10)));
        assert_eq!(parse_month_selection("2025-10-31"), Ok((2025, 10)));
        assert!(parse_month_selection("2025-13").is_err());
    }
}
