//! Core library for price-quotation line-item extraction.
//!
//! This crate provides:
//! - Locale-aware parsing of numeric tokens (`1.234,56` vs `1,234.56`)
//! - Line classification separating header noise from product rows
//! - Right-to-left column inference and positional field mapping
//! - A tiered extraction pipeline (AI-assisted, strict and loose heuristics)
//! - PDF text extraction feeding the pipeline (`native` feature)

pub mod error;
pub mod extraction;
pub mod models;
#[cfg(feature = "native")]
pub mod pdf;

pub use error::{AiError, ExtractionError, QuotexError, Result};
pub use extraction::{
    AiExtractor, DocumentText, ExtractionPipeline, HeuristicParser, NumericToken, parse_amount,
};
pub use models::quotation::{ExtractionResult, LineItem, Strategy, TierAttempt};
#[cfg(feature = "native")]
pub use pdf::{PdfExtractor, TextSource};
