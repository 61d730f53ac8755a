//! PDF text extraction using lopdf and pdf-extract.

use std::panic::{self, AssertUnwindSafe};

use lopdf::{Document, Object};
use tracing::{debug, trace};

use super::{PdfProcessor, PdfType, Result, TextSource};
use crate::error::PdfError;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    min_text_length: usize,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            min_text_length: 20,
        }
    }

    /// Set the text length under which a document counts as having no text layer.
    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    /// Classify already extracted text against the loaded document.
    fn content_type(&self, text: &str) -> PdfType {
        let has_text = text.trim().len() >= self.min_text_length;

        let pdf_type = match (has_text, self.has_images()) {
            (true, _) => PdfType::Text,
            (false, true) => PdfType::Scanned,
            (false, false) => PdfType::Empty,
        };

        debug!("PDF analysis: has_text={} -> {:?}", has_text, pdf_type);
        pdf_type
    }

    /// Whether any object in the document is an image XObject.
    fn has_images(&self) -> bool {
        let Some(doc) = self.document.as_ref() else {
            return false;
        };

        doc.objects.values().any(|object| match object {
            Object::Stream(stream) => stream
                .dict
                .get(b"Subtype")
                .and_then(|s| s.as_name())
                .is_ok_and(|name| name == b"Image"),
            _ => false,
        })
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // Save decrypted document to raw_data for pdf_extract
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn analyze(&self) -> PdfType {
        let text = self.extract_text().unwrap_or_default();
        self.content_type(&text)
    }

    fn extract_text(&self) -> Result<String> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        // pdf-extract panics on some malformed font tables
        let data = &self.raw_data;
        panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data)))
            .map_err(|_| PdfError::TextExtraction("text extraction panicked".to_string()))?
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

/// Production [`TextSource`] backed by [`PdfExtractor`].
#[derive(Debug, Clone)]
pub struct PdfTextSource {
    min_text_length: usize,
}

impl PdfTextSource {
    pub fn new(min_text_length: usize) -> Self {
        Self { min_text_length }
    }
}

impl Default for PdfTextSource {
    fn default() -> Self {
        Self::new(20)
    }
}

impl TextSource for PdfTextSource {
    fn extract_lines(&self, data: &[u8]) -> Result<Vec<String>> {
        let mut extractor = PdfExtractor::new().with_min_text_length(self.min_text_length);
        extractor.load(data)?;

        let text = extractor.extract_text()?;
        let pdf_type = extractor.content_type(&text);
        if pdf_type != PdfType::Text {
            debug!(
                "PDF has {} pages but no usable text layer ({:?})",
                extractor.page_count(),
                pdf_type
            );
            return Ok(Vec::new());
        }

        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        trace!("Extracted {} text lines", lines.len());
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert_eq!(extractor.analyze(), PdfType::Empty);
    }

    #[test]
    fn test_content_type_uses_given_text() {
        let extractor = PdfExtractor::new().with_min_text_length(10);
        assert_eq!(extractor.content_type("  short  "), PdfType::Empty);
        assert_eq!(extractor.content_type("Client: Acme, Chantier: Site A"), PdfType::Text);
    }

    #[test]
    fn test_extract_text_without_document() {
        let extractor = PdfExtractor::new();
        assert!(matches!(extractor.extract_text(), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        let err = extractor.load(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_text_source_propagates_parse_errors() {
        let source = PdfTextSource::default();
        assert!(source.extract_lines(b"%PDF-1.4 truncated").is_err());
    }
}
