//! Data models shared by the extraction engine and its collaborators.

pub mod config;
pub mod quotation;

pub use config::{AiConfig, ExtractionConfig, PdfConfig, QuotexConfig, StorageConfig};
pub use quotation::{ExtractionResult, LineItem, Strategy, TierAttempt};
