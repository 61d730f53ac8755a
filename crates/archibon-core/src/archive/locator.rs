//! Read access to archived PDFs, confined to the archive root.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{AccessError, Result};

/// MIME type of every document served from the archive.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// An archived PDF opened for reading.
#[derive(Debug)]
pub struct PdfDocument {
    /// Canonical location.
    pub path: PathBuf,
    pub file: File,
    pub len: u64,
    pub content_type: &'static str,
}

/// Resolves caller-supplied paths to PDFs under a fixed root.
#[derive(Debug, Clone)]
pub struct SecureFileLocator {
    root: PathBuf,
}

impl SecureFileLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open `requested` if it names an existing PDF inside the root.
    ///
    /// Relative paths are taken from the root. Symlinks and `..` are
    /// resolved before the containment check.
    pub fn resolve_for_read(&self, requested: &str) -> Result<PdfDocument> {
        let requested_path = Path::new(requested);
        let candidate = if requested_path.is_absolute() {
            requested_path.to_path_buf()
        } else {
            self.root.join(requested_path)
        };

        if !candidate.is_file() || !has_pdf_extension(&candidate) {
            return Err(AccessError::NotFound(candidate).into());
        }

        let canonical = candidate.canonicalize()?;
        // nothing can be inside a root that does not exist
        let Ok(root) = self.root.canonicalize() else {
            warn!("Archive root {} is missing", self.root.display());
            return Err(AccessError::Forbidden(candidate).into());
        };
        if !canonical.starts_with(&root) {
            warn!("Refused read outside archive: {}", canonical.display());
            return Err(AccessError::Forbidden(candidate).into());
        }

        let file = File::open(&canonical)?;
        let len = file.metadata()?.len();
        Ok(PdfDocument {
            path: canonical,
            file,
            len,
            content_type: PDF_CONTENT_TYPE,
        })
    }
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
