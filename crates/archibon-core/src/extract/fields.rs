//! Client / site / equipment extraction from delivery-note text.

use tracing::{debug, warn};

use super::patterns::{is_label_line, labelled_value, CLIENT_LABEL, EQUIPMENT_LABEL, SITE_LABEL};
use crate::models::document::ExtractedFields;
use crate::naming::sanitize;
use crate::pdf::TextSource;

/// Labelled-line field extractor.
///
/// Each field takes the value of the first line starting with its label; the
/// site may continue on the next line.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    site_continuation: bool,
}

impl FieldExtractor {
    /// Create a new extractor with site continuation enabled.
    pub fn new() -> Self {
        Self {
            site_continuation: true,
        }
    }

    /// Set whether the line after the site label may be appended to the site.
    pub fn with_site_continuation(mut self, enabled: bool) -> Self {
        self.site_continuation = enabled;
        self
    }

    /// Extract fields from text lines. Values are sanitized.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> ExtractedFields {
        let mut client: Option<String> = None;
        let mut site: Option<String> = None;
        let mut equipment: Option<String> = None;

        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref().trim();

            if client.is_none() && CLIENT_LABEL.is_match(line) {
                client = labelled_value(line).map(str::to_string);
            } else if site.is_none() && SITE_LABEL.is_match(line) {
                let mut value = labelled_value(line).unwrap_or_default().to_string();
                if let Some(next) = lines.get(i + 1).map(|l| l.as_ref().trim()) {
                    if self.continues_site(next) {
                        value.push(' ');
                        value.push_str(next);
                    }
                }
                site = Some(value.trim().to_string());
            } else if equipment.is_none() && EQUIPMENT_LABEL.is_match(line) {
                equipment = labelled_value(line).map(str::to_string);
            }

            if client.is_some() && site.is_some() && equipment.is_some() {
                break;
            }
        }

        let fields = ExtractedFields {
            client: sanitize(&client.unwrap_or_default()),
            site: sanitize(&site.unwrap_or_default()),
            equipment: sanitize(&equipment.unwrap_or_default()),
        };
        debug!(?fields, "Extracted fields from {} lines", lines.len());
        fields
    }

    /// Extract fields from raw PDF bytes. Failures yield empty fields.
    pub fn extract_document(&self, source: &dyn TextSource, data: &[u8]) -> ExtractedFields {
        match source.extract_lines(data) {
            Ok(lines) => self.extract(lines.as_slice()),
            Err(e) => {
                warn!("Could not read document text: {}", e);
                ExtractedFields::default()
            }
        }
    }

    // Blank lines and labelled lines (the "Réf. chantier" line in particular)
    // never belong to the site.
    fn continues_site(&self, next: &str) -> bool {
        self.site_continuation && !next.is_empty() && !is_label_line(next)
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}
