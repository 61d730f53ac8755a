//! Configuration structures for the archive engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for archibon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchibonConfig {
    /// Archive tree layout.
    pub archive: ArchiveSettings,

    /// Classification rules.
    pub classification: ClassificationConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,
}

/// Where the archive lives and how its reserved entries are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSettings {
    /// Archive root directory.
    pub root: PathBuf,

    /// Reserved subtree holding invoice bundles, relative to the root.
    pub invoices_dir: String,

    /// Staging area for analysed uploads, relative to the root.
    pub staging_dir: String,

    /// Ledger file name, stored at the root.
    pub ledger_file: String,

    /// Prefix given to purchase-order attachments inside a bundle.
    pub purchase_order_prefix: String,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("Archivage_Bons"),
            invoices_dir: "Factures".to_string(),
            staging_dir: "_uploads_temp".to_string(),
            ledger_file: "historique.csv".to_string(),
            purchase_order_prefix: "BC_".to_string(),
        }
    }
}

/// Classification configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Refuse to archive without a reference date (month-code folders).
    pub require_reference_date: bool,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum text length to consider the PDF as having a text layer.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { min_text_length: 20 }
    }
}

impl ArchibonConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
