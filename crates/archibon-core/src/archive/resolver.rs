//! Destination of a classified document inside the archive.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::layout::ArchiveLayout;
use crate::calendar::MonthCode;
use crate::error::{Result, ValidationError};
use crate::models::document::ExtractedFields;

/// Resolved location of one archived document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivePath {
    /// `root/[month]/client/site/equipment`
    pub directory: PathBuf,
    /// `{client}_{site}_{equipment}_{original stem}{extension}`
    pub file_name: String,
    /// Month-code folder, present when a reference date was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_code: Option<MonthCode>,
    /// Sanitized fields the path was built from.
    pub fields: ExtractedFields,
}

impl ArchivePath {
    /// Full path of the archived file.
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Parse an operator-entered `YYYY-MM-DD` reference date.
pub fn parse_reference_date(text: &str) -> std::result::Result<NaiveDate, ValidationError> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidReferenceDate(text.to_string()))
}

/// Computes archive destinations and creates their directories.
#[derive(Debug, Clone)]
pub struct ArchivePathResolver<'a> {
    layout: &'a ArchiveLayout,
    require_reference_date: bool,
}

impl<'a> ArchivePathResolver<'a> {
    pub fn new(layout: &'a ArchiveLayout) -> Self {
        Self {
            layout,
            require_reference_date: false,
        }
    }

    /// Refuse to resolve without a reference date.
    pub fn with_required_reference_date(mut self, required: bool) -> Self {
        self.require_reference_date = required;
        self
    }

    /// Validate and compute the destination without touching the filesystem.
    pub fn plan(
        &self,
        fields: &ExtractedFields,
        original_file_name: &str,
        reference_date: Option<NaiveDate>,
    ) -> Result<ArchivePath> {
        let fields = fields.normalized();
        if let Some(missing) = fields.first_missing() {
            return Err(ValidationError::MissingField(missing).into());
        }
        if let Some(unsafe_field) = fields.first_unsafe() {
            return Err(ValidationError::InvalidField(unsafe_field).into());
        }

        let month_code = match reference_date {
            Some(date) => Some(MonthCode::from_date(date).ok_or_else(|| {
                ValidationError::ReferenceDateOutOfRange(date.to_string())
            })?),
            None if self.require_reference_date => {
                return Err(ValidationError::MissingReferenceDate.into());
            }
            None => None,
        };

        let (stem, extension) = split_original_name(original_file_name);

        let mut directory = self.layout.root().to_path_buf();
        if let Some(code) = &month_code {
            directory.push(code.as_str());
        }
        directory.push(&fields.client);
        directory.push(&fields.site);
        directory.push(&fields.equipment);

        let file_name = format!(
            "{}_{}_{}_{}{}",
            fields.client, fields.site, fields.equipment, stem, extension
        );

        Ok(ArchivePath {
            directory,
            file_name,
            month_code,
            fields,
        })
    }

    /// Compute the destination and create its directory.
    pub fn resolve(
        &self,
        fields: &ExtractedFields,
        original_file_name: &str,
        reference_date: Option<NaiveDate>,
    ) -> Result<ArchivePath> {
        let target = self.plan(fields, original_file_name, reference_date)?;
        fs::create_dir_all(&target.directory)?;
        debug!("Resolved archive path {}", target.path().display());
        Ok(target)
    }
}

// Upload names may carry client-side directories; only the final component
// is used. The extension keeps its leading dot.
fn split_original_name(name: &str) -> (String, String) {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);
    let path = Path::new(base);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;
    use pretty_assertions::assert_eq;

    fn fields() -> ExtractedFields {
        ExtractedFields::new("Acme", "SiteA", "Crane1")
    }

    #[test]
    fn test_resolve_dated_path() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArchiveLayout::new(dir.path());
        let date = parse_reference_date("2025-10-15").unwrap();

        let target = ArchivePathResolver::new(&layout)
            .resolve(&fields(), "BL 0042.pdf", Some(date))
            .unwrap();

        assert_eq!(target.directory, dir.path().join("oct25/Acme/SiteA/Crane1"));
        assert_eq!(target.file_name, "Acme_SiteA_Crane1_BL 0042.pdf");
        assert_eq!(target.month_code, MonthCode::new(2025, 10));
        assert!(target.directory.is_dir());
    }

    #[test]
    fn test_resolve_undated_path_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArchiveLayout::new(dir.path());
        let resolver = ArchivePathResolver::new(&layout);

        let first = resolver.resolve(&fields(), "scan.PDF", None).unwrap();
        let second = resolver.resolve(&fields(), "scan.PDF", None).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.path(), dir.path().join("Acme/SiteA/Crane1/Acme_SiteA_Crane1_scan.PDF"));
    }

    #[test]
    fn test_fields_are_sanitized_in_every_segment() {
        let layout = ArchiveLayout::new("/archive");
        let target = ArchivePathResolver::new(&layout)
            .plan(
                &ExtractedFields::new(" Acme/Corp ", "Lot 3: Nord", "Pelle|20t"),
                "bon.pdf",
                None,
            )
            .unwrap();

        assert_eq!(target.directory, PathBuf::from("/archive/Acme-Corp/Lot 3- Nord/Pelle-20t"));
        assert_eq!(target.file_name, "Acme-Corp_Lot 3- Nord_Pelle-20t_bon.pdf");
    }

    #[test]
    fn test_original_name_directories_are_dropped() {
        assert_eq!(
            split_original_name(r"C:\Users\op\Desktop\bl.pdf"),
            ("bl".to_string(), ".pdf".to_string())
        );
        assert_eq!(
            split_original_name("../../etc/passwd"),
            ("passwd".to_string(), String::new())
        );
        assert_eq!(
            split_original_name("archive.tar.gz"),
            ("archive.tar".to_string(), ".gz".to_string())
        );
    }

    #[test]
    fn test_missing_field_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArchiveLayout::new(dir.path().join("root"));

        let err = ArchivePathResolver::new(&layout)
            .resolve(&ExtractedFields::new("Acme", " ", "Crane1"), "bl.pdf", None)
            .unwrap_err();

        assert!(matches!(
            err,
            ArchiveError::Validation(ValidationError::MissingField("site"))
        ));
        assert!(!layout.root().exists());
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArchiveLayout::new(dir.path().join("root"));
        let resolver = ArchivePathResolver::new(&layout);

        let err = resolver
            .resolve(&ExtractedFields::new("..", "..", "escaped"), "bl.pdf", None)
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Validation(ValidationError::InvalidField("client"))
        ));

        let err = resolver
            .plan(&ExtractedFields::new("Acme", "SiteA", "."), "bl.pdf", None)
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Validation(ValidationError::InvalidField("equipment"))
        ));

        assert!(!layout.root().exists());
        assert!(!dir.path().join("escaped").exists());
    }

    #[test]
    fn test_required_reference_date() {
        let layout = ArchiveLayout::new("/archive");
        let err = ArchivePathResolver::new(&layout)
            .with_required_reference_date(true)
            .plan(&fields(), "bl.pdf", None)
            .unwrap_err();

        assert!(matches!(
            err,
            ArchiveError::Validation(ValidationError::MissingReferenceDate)
        ));
    }

    #[test]
    fn test_reference_date_out_of_range() {
        let layout = ArchiveLayout::new("/archive");
        let date = NaiveDate::from_ymd_opt(1998, 3, 1).unwrap();
        let err = ArchivePathResolver::new(&layout)
            .plan(&fields(), "bl.pdf", Some(date))
            .unwrap_err();

        assert!(matches!(
            err,
            ArchiveError::Validation(ValidationError::ReferenceDateOutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_reference_date() {
        assert_eq!(
            parse_reference_date(" 2025-10-15 "),
            Ok(NaiveDate::from_ymd_opt(2025, 10, 15).unwrap())
        );
        assert_eq!(
            parse_reference_date("15/10/2025"),
            Err(ValidationError::InvalidReferenceDate("15/10/2025".to_string()))
        );
        assert!(parse_reference_date("2025-02-30").is_err());
    }
}
