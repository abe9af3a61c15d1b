//! Document text as handed over by the text-extraction collaborator.

use crate::error::ExtractionError;

/// Immutable line-oriented text of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    text: String,
}

impl DocumentText {
    /// Join per-page text blocks with newline separators.
    ///
    /// Image-only pages arrive as empty strings; if every page is empty the
    /// document is unextractable.
    pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Result<Self, ExtractionError> {
        let mut text = String::new();
        for page in pages {
            text.push_str(page.as_ref());
            text.push('\n');
        }
        Self::from_text(text)
    }

    /// Wrap already-joined text.
    pub fn from_text(text: impl Into<String>) -> Result<Self, ExtractionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ExtractionError::NoExtractableContent);
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Lines in document order, untrimmed.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pages_joined_with_newlines() {
        let doc = DocumentText::from_pages(&["Acme Supply Co.", "", "Widget Blue 10 2.50 25.00"]).unwrap();
        assert_eq!(doc.as_str(), "Acme Supply Co.\n\nWidget Blue 10 2.50 25.00\n");
        assert_eq!(doc.line_count(), 3);
    }

    #[test]
    fn test_all_empty_pages_rejected() {
        let pages: [&str; 3] = ["", "  \n", "\t"];
        assert_eq!(
            DocumentText::from_pages(&pages),
            Err(ExtractionError::NoExtractableContent)
        );
        let none: [&str; 0] = [];
        assert_eq!(
            DocumentText::from_pages(&none),
            Err(ExtractionError::NoExtractableContent)
        );
    }

    #[test]
    fn test_whitespace_text_rejected() {
        assert_eq!(
            DocumentText::from_text(" \n \r\n "),
            Err(ExtractionError::NoExtractableContent)
        );
    }
}
