//! Delivery-note data models.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::calendar::MonthCode;
use crate::naming::sanitize;

/// The three classification fields of a delivery note.
///
/// Any field may be empty when it could not be found in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Company the goods were delivered to.
    pub client: String,
    /// Jobsite.
    pub site: String,
    /// Machine.
    pub equipment: String,
}

impl ExtractedFields {
    pub fn new(
        client: impl Into<String>,
        site: impl Into<String>,
        equipment: impl Into<String>,
    ) -> Self {
        Self {
            client: client.into(),
            site: site.into(),
            equipment: equipment.into(),
        }
    }

    /// Trimmed and sanitized copy, as used for folder names.
    pub fn normalized(&self) -> Self {
        Self {
            client: sanitize(self.client.trim()),
            site: sanitize(self.site.trim()),
            equipment: sanitize(self.equipment.trim()),
        }
    }

    /// True when all three fields are filled in.
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    /// Name of the first empty field, in client, site, equipment order.
    pub fn first_missing(&self) -> Option<&'static str> {
        [
            ("client", &self.client),
            ("site", &self.site),
            ("equipment", &self.equipment),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }

    /// Name of the first field made only of dots, which would walk out of
    /// its parent folder.
    pub fn first_unsafe(&self) -> Option<&'static str> {
        [
            ("client", &self.client),
            ("site", &self.site),
            ("equipment", &self.equipment),
        ]
        .into_iter()
        .find(|(_, value)| {
            let value = value.trim();
            !value.is_empty() && value.chars().all(|c| c == '.')
        })
        .map(|(name, _)| name)
    }

    /// Fill empty fields from `other`, keeping the values already set.
    pub fn or(self, other: ExtractedFields) -> Self {
        fn pick(mine: String, theirs: String) -> String {
            if mine.trim().is_empty() { theirs } else { mine }
        }
        Self {
            client: pick(self.client, other.client),
            site: pick(self.site, other.site),
            equipment: pick(self.equipment, other.equipment),
        }
    }
}

/// Classification of an archived document, read back from its folder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Month-code folder, absent for trees without month folders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<MonthCode>,
    pub client: String,
    pub site: String,
    pub equipment: String,
}

/// An archived file found while scanning the tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    /// File name inside its equipment folder.
    pub file_name: String,
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Last modification time, when the filesystem reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Local>>,
}
