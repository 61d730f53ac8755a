//! Label patterns found on delivery notes.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Colon, hyphen or en-dash after a label
    pub static ref SEPARATOR: Regex = Regex::new(r"[:\-–]").unwrap();

    pub static ref CLIENT_LABEL: Regex = Regex::new(
        r"(?i)^client\s*[:\-–]"
    ).unwrap();

    pub static ref SITE_LABEL: Regex = Regex::new(
        r"(?i)^chantier\s*[:\-–]"
    ).unwrap();

    pub static ref EQUIPMENT_LABEL: Regex = Regex::new(
        r"(?i)^mat[ée]riel\s*[:\-–]"
    ).unwrap();

    // "Réf. chantier: 12" follows the site line on most layouts
    pub static ref SITE_REFERENCE_LABEL: Regex = Regex::new(
        r"(?i)^r[ée]f\.?\s*chantier\s*[:\-–]"
    ).unwrap();
}

/// Value after the first separator of a labelled line, trimmed.
pub fn labelled_value(line: &str) -> Option<&str> {
    SEPARATOR
        .find(line)
        .map(|m| line[m.end()..].trim())
}

/// Whether a line opens any field this module knows about.
pub fn is_label_line(line: &str) -> bool {
    CLIENT_LABEL.is_match(line)
        || SITE_LABEL.is_match(line)
        || EQUIPMENT_LABEL.is_match(line)
        || SITE_REFERENCE_LABEL.is_match(line)
}
