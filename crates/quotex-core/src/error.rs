//! Error types for the quotex-core library.

use thiserror::Error;

/// Main error type for the quotex library.
#[derive(Error, Debug)]
pub enum QuotexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Line-item extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// AI extraction service error.
    #[error("AI extraction error: {0}")]
    Ai(#[from] AiError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Request-level extraction failures.
///
/// These are the only conditions surfaced to the caller; everything else
/// degrades through the strategy tiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The document produced no usable text at all.
    #[error("no text found in document (it may be a scanned image that requires OCR)")]
    NoExtractableContent,

    /// Every strategy tier ran and none produced an item.
    #[error("could not extract any items")]
    EmptyExtraction,
}

/// Failures of the external AI extraction collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    /// The request could not be delivered or the connection failed.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service did not answer within the configured bound.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("service returned status {code}: {body}")]
    Status { code: u16, body: String },

    /// The response body could not be interpreted as an item list.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The response parsed but contained no items.
    #[error("response contained no items")]
    EmptyItems,

    /// The service rejected the API key.
    #[error("credential rejected")]
    CredentialRejected,
}

/// Result type for the quotex library.
pub type Result<T> = std::result::Result<T, QuotexError>;
