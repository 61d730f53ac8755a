//! Regrouping archived delivery notes into invoice folders.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::index::ArchiveIndex;
use super::layout::ArchiveLayout;
use crate::error::{Result, ValidationError};
use crate::naming::sanitize;

/// Purchase order to store next to the bundled delivery notes.
#[derive(Debug, Clone)]
pub struct PurchaseOrder {
    /// Name the document was uploaded under.
    pub file_name: String,
    pub data: Vec<u8>,
}

/// What happened to each requested path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BundleOutcome {
    /// Invoice folder.
    pub folder: PathBuf,
    /// New locations of the moved documents.
    pub moved: Vec<PathBuf>,
    /// Requested paths that no longer exist.
    pub missing: Vec<PathBuf>,
    /// Requested paths outside the classified part of the archive.
    pub rejected: Vec<PathBuf>,
    /// Where the purchase order was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_order: Option<PathBuf>,
}

/// Moves archived documents into `Invoices/<name>/`.
///
/// Not transactional: each path is handled on its own and stale paths are
/// skipped, so a partially applied bundle is a normal outcome.
#[derive(Debug, Clone)]
pub struct InvoiceBundler<'a> {
    layout: &'a ArchiveLayout,
}

impl<'a> InvoiceBundler<'a> {
    pub fn new(layout: &'a ArchiveLayout) -> Self {
        Self { layout }
    }

    /// Folder a bundle with this name lives in.
    pub fn folder_for(&self, invoice_name: &str) -> Result<PathBuf> {
        let name = sanitize(invoice_name.trim());
        // "." and ".." survive sanitizing but would escape the invoices folder
        if name.is_empty() || name.chars().all(|c| c == '.') {
            return Err(ValidationError::EmptyInvoiceName.into());
        }
        Ok(self.layout.invoices_dir().join(name))
    }

    pub fn bundle(
        &self,
        invoice_name: &str,
        files: &[PathBuf],
        purchase_order: Option<&PurchaseOrder>,
    ) -> Result<BundleOutcome> {
        let folder = self.folder_for(invoice_name)?;
        fs::create_dir_all(&folder)?;

        let mut outcome = BundleOutcome {
            folder: folder.clone(),
            ..BundleOutcome::default()
        };

        for source in files {
            if !source.is_file() {
                debug!("Skipping stale bundle entry {}", source.display());
                outcome.missing.push(source.clone());
                continue;
            }
            if !self.is_bundleable(source) {
                warn!("Refusing to bundle {}: not a classified document", source.display());
                outcome.rejected.push(source.clone());
                continue;
            }
            let Some(file_name) = source.file_name() else {
                outcome.rejected.push(source.clone());
                continue;
            };

            let target = folder.join(file_name);
            match move_file(source, &target) {
                Ok(()) => outcome.moved.push(target),
                // lost a race with another bundling request
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("{} vanished before it could be moved", source.display());
                    outcome.missing.push(source.clone());
                }
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(order) = purchase_order {
            let (stem, extension) = order_name_parts(&order.file_name);
            let target = folder.join(format!(
                "{}{}{}",
                self.layout.purchase_order_prefix(),
                sanitize(&stem),
                extension
            ));
            fs::write(&target, &order.data)?;
            outcome.purchase_order = Some(target);
        }

        info!(
            "Invoice {}: {} moved, {} missing, {} rejected",
            folder.display(),
            outcome.moved.len(),
            outcome.missing.len(),
            outcome.rejected.len()
        );
        Ok(outcome)
    }

    // Only classified documents: inside the root at a client/site/equipment
    // position, outside the invoices and staging subtrees, never the ledger
    fn is_bundleable(&self, path: &Path) -> bool {
        let (Ok(root), Ok(file)) = (self.layout.root().canonicalize(), path.canonicalize()) else {
            return false;
        };
        if !file.starts_with(&root) {
            return false;
        }
        if let Ok(ledger) = self.layout.ledger_path().canonicalize() {
            if file == ledger {
                return false;
            }
        }
        let reserved = self
            .layout
            .reserved_dirs()
            .iter()
            .filter_map(|dir| dir.canonicalize().ok())
            .any(|dir| file.starts_with(dir));
        !reserved && ArchiveIndex::new(root).classify(&file).is_some()
    }
}

fn order_name_parts(name: &str) -> (String, String) {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let path = Path::new(base);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "commande".to_string());
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, extension)
}

/// Rename, falling back to copy + delete across filesystems.
pub(crate) fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if from == to {
        return Ok(());
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if matches!(e.kind(), ErrorKind::CrossesDevices | ErrorKind::PermissionDenied) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}
