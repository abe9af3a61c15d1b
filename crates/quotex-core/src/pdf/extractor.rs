//! Per-page PDF text extraction using lopdf, with pdf-extract as fallback.

use lopdf::Document;
use tracing::{debug, trace, warn};

use super::{Result, TextSource};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// PDF text extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    max_pages: usize,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            max_pages: 0,
        }
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            ..Self::new()
        }
    }

    /// Load a PDF from bytes and return its page texts.
    pub fn pages_from_bytes(data: &[u8], config: &PdfConfig) -> Result<Vec<String>> {
        let mut extractor = Self::from_config(config);
        extractor.load(data)?;
        extractor.extract_pages()
    }

    fn pages_to_read(&self) -> u32 {
        let count = self.page_count();
        match self.max_pages {
            0 => count,
            max => count.min(max as u32),
        }
    }

    /// Whole-document text through pdf-extract, used when lopdf finds no
    /// text on any page (unusual font encodings).
    fn extract_whole_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

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

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self
            .document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))?;

        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }

        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_pages(&self) -> Result<Vec<String>> {
        let page_count = self.pages_to_read();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        let mut pages = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            let text = match self.extract_page_text(page) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Page {}: {}", page, e);
                    String::new()
                }
            };
            trace!("Page {}: {} chars", page, text.len());
            pages.push(text);
        }

        if pages.iter().all(|p| p.trim().is_empty()) {
            debug!("lopdf found no text, retrying with pdf-extract");
            let whole = self.extract_whole_text()?;
            if !whole.trim().is_empty() {
                return Ok(vec![whole]);
            }
        }

        Ok(pages)
    }
}
