//! WASM bindings for price-quotation line-item extraction.
//!
//! The interactive front end runs the same heuristic tiers as the CLI. The
//! AI tier needs a network client and is left to the service side.

use js_sys::Array;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use quotex_core::extraction::{Classification, ExtractionPipeline, FieldMapper, MappedFields};
use quotex_core::models::config::QuotexConfig;
use quotex_core::{DocumentText, NumericToken};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

/// Extract line items from quotation text with default settings.
///
/// Throws when the text is blank or no tier finds an item.
#[wasm_bindgen]
pub fn extract_items_from_text(text: &str) -> Result<JsValue, JsValue> {
    QuotationExtractor::new().extract(text)
}

/// Parse a locale-ambiguous amount such as `1.234,56` or `USD 12.50`.
#[wasm_bindgen]
pub fn parse_amount(token: &str) -> Option<f64> {
    quotex_core::parse_amount(token).and_then(|d| d.to_f64())
}

/// Column report for one line, as shown by the interactive inspector.
#[derive(Debug, Serialize)]
struct LineReport {
    text: String,
    candidate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    noise_reason: Option<String>,
    descriptive: Vec<String>,
    trailing: Vec<Decimal>,
    product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldsReport>,
}

#[derive(Debug, Serialize)]
struct FieldsReport {
    quantity: Decimal,
    unit_price: Decimal,
    tax_amount: Option<Decimal>,
    total_price: Decimal,
}

impl From<MappedFields> for FieldsReport {
    fn from(fields: MappedFields) -> Self {
        Self {
            quantity: fields.quantity,
            unit_price: fields.unit_price,
            tax_amount: fields.tax_amount,
            total_price: fields.total_price,
        }
    }
}

/// Classify a single line and show how its columns were read.
#[wasm_bindgen]
pub fn inspect_line(line: &str) -> Result<JsValue, JsValue> {
    let pipeline = ExtractionPipeline::new();
    to_js(&line_report(&pipeline, &FieldMapper::new(), line))
}

fn line_report(pipeline: &ExtractionPipeline, mapper: &FieldMapper, line: &str) -> LineReport {
    let analyzed = pipeline.heuristic().analyze_line(line);
    let noise_reason = match analyzed.classification {
        Classification::Noise(reason) => Some(reason.to_string()),
        Classification::Candidate => None,
    };
    let columns = analyzed.columns.unwrap_or_default();
    let fields = mapper.map(&columns.trailing).map(FieldsReport::from);

    LineReport {
        text: analyzed.text,
        candidate: noise_reason.is_none(),
        noise_reason,
        descriptive: columns.descriptive,
        trailing: columns.trailing,
        product_id: columns.product_id,
        fields,
    }
}

/// Quotation extractor class for browser use.
#[wasm_bindgen]
pub struct QuotationExtractor {
    pipeline: ExtractionPipeline,
    mapper: FieldMapper,
}

#[wasm_bindgen]
impl QuotationExtractor {
    /// Create an extractor with default thresholds.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::with_config(&QuotexConfig::default())
    }

    /// Create an extractor from a JSON configuration document.
    #[wasm_bindgen]
    pub fn from_config_json(json: &str) -> Result<QuotationExtractor, JsValue> {
        let config: QuotexConfig = serde_json::from_str(json).map_err(js_error)?;
        Ok(Self::with_config(&config))
    }

    /// Extract items from already-joined document text.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        let document = DocumentText::from_text(text).map_err(js_error)?;
        let result = self.pipeline.extract(&document, None).map_err(js_error)?;
        to_js(&result)
    }

    /// Extract items from an array of per-page texts.
    #[wasm_bindgen]
    pub fn extract_pages(&self, pages: Array) -> Result<JsValue, JsValue> {
        let pages: Vec<String> = pages.iter().map(|page| page.as_string().unwrap_or_default()).collect();
        let result = self.pipeline.extract_pages(&pages, None).map_err(js_error)?;
        to_js(&result)
    }

    /// Report every line of a document with its classification and columns.
    #[wasm_bindgen]
    pub fn inspect(&self, text: &str) -> Result<JsValue, JsValue> {
        let reports: Vec<LineReport> = text
            .lines()
            .map(|line| line_report(&self.pipeline, &self.mapper, line))
            .collect();
        to_js(&reports)
    }

    /// Supplier name detected from the document head.
    #[wasm_bindgen]
    pub fn detect_supplier(&self, text: &str) -> Result<String, JsValue> {
        let document = DocumentText::from_text(text).map_err(js_error)?;
        Ok(self.pipeline.heuristic().supplier(&document))
    }
}

impl QuotationExtractor {
    fn with_config(config: &QuotexConfig) -> Self {
        Self {
            pipeline: ExtractionPipeline::from_config(config),
            mapper: FieldMapper::from_config(&config.extraction),
        }
    }
}

impl Default for QuotationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Describe how a single token's separators were read.
#[wasm_bindgen]
pub fn describe_amount(token: &str) -> String {
    let parsed = NumericToken::parse(token);
    match parsed.value {
        Some(value) => format!("{} ({:?})", value, parsed.rule),
        None => "unparseable".to_string(),
    }
}
