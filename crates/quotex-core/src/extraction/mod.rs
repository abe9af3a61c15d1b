//! Line-item extraction module.

pub mod ai;
pub mod classifier;
pub mod columns;
mod document;
pub mod fields;
mod heuristic;
pub mod numeric;
mod pipeline;

pub use ai::{AiExtractor, build_prompt, parse_response, strip_code_fence};
pub use classifier::{Classification, LineClassifier, NoiseReason, detect_supplier};
pub use columns::{ColumnInferencer, InferredColumns, ScatteredColumns};
pub use document::DocumentText;
pub use fields::{FieldMapper, MappedFields};
pub use heuristic::{CandidateLine, HeuristicParser};
pub use numeric::{LocaleRule, NumericToken, parse_amount};
pub use pipeline::ExtractionPipeline;

use crate::error::ExtractionError;
use crate::models::quotation::ExtractionResult;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for quotation line-item extractors.
pub trait ItemExtractor {
    /// Extract line items from document text, optionally using an AI credential.
    fn extract(&self, document: &DocumentText, credential: Option<&str>) -> Result<ExtractionResult>;
}
