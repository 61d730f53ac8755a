//! Locations of the archive root and its reserved entries.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::models::config::ArchiveSettings;

/// Resolved archive layout.
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    root: PathBuf,
    invoices_dir: PathBuf,
    staging_dir: PathBuf,
    ledger_path: PathBuf,
    purchase_order_prefix: String,
}

impl ArchiveLayout {
    /// Layout with the default reserved names under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_settings(&ArchiveSettings {
            root: root.into(),
            ..ArchiveSettings::default()
        })
    }

    pub fn from_settings(settings: &ArchiveSettings) -> Self {
        let root = settings.root.clone();
        Self {
            invoices_dir: root.join(&settings.invoices_dir),
            staging_dir: root.join(&settings.staging_dir),
            ledger_path: root.join(&settings.ledger_file),
            purchase_order_prefix: settings.purchase_order_prefix.clone(),
            root,
        }
    }

    /// Create the root, invoices and staging directories if missing.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.root, &self.invoices_dir, &self.staging_dir] {
            fs::create_dir_all(dir)?;
        }
        debug!("Archive layout ready at {}", self.root.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserved subtree holding invoice bundles.
    pub fn invoices_dir(&self) -> &Path {
        &self.invoices_dir
    }

    /// Staging area for analysed uploads.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    pub fn purchase_order_prefix(&self) -> &str {
        &self.purchase_order_prefix
    }

    /// Directories never scanned as classified documents.
    pub fn reserved_dirs(&self) -> [&Path; 2] {
        [&self.invoices_dir, &self.staging_dir]
    }
}
