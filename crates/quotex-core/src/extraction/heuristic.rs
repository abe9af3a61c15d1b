//! Rule-based line-item extraction over document lines.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::classifier::{Classification, LineClassifier, detect_supplier};
use super::columns::{ColumnInferencer, InferredColumns};
use super::document::DocumentText;
use super::fields::FieldMapper;
use crate::models::config::ExtractionConfig;
use crate::models::quotation::LineItem;

/// A line with its classification and, for candidates, its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    pub text: String,
    pub classification: Classification,
    pub columns: Option<InferredColumns>,
}

/// Heuristic quotation parser with a strict and a loose mode.
#[derive(Debug, Clone)]
pub struct HeuristicParser {
    classifier: LineClassifier,
    inferencer: ColumnInferencer,
    mapper: FieldMapper,
    supplier_scan_lines: usize,
    unknown_supplier: String,
    max_name_tokens: usize,
}

impl HeuristicParser {
    /// Create a parser with default thresholds.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            classifier: LineClassifier::from_config(config),
            inferencer: ColumnInferencer::from_config(config),
            mapper: FieldMapper::from_config(config),
            supplier_scan_lines: config.supplier_scan_lines,
            unknown_supplier: config.unknown_supplier.clone(),
            max_name_tokens: config.max_name_tokens,
        }
    }

    /// Supplier name for the whole document.
    pub fn supplier(&self, document: &DocumentText) -> String {
        let head: Vec<&str> = document.lines().take(self.supplier_scan_lines).collect();
        detect_supplier(&head, self.supplier_scan_lines)
            .unwrap_or_else(|| self.unknown_supplier.clone())
    }

    /// Classify a line and infer its columns if it is a candidate.
    pub fn analyze_line(&self, line: &str) -> CandidateLine {
        let text = line.trim();
        let classification = self.classifier.classify(text);
        let columns = classification.is_candidate().then(|| {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            self.inferencer.infer(&tokens)
        });

        CandidateLine {
            text: text.to_string(),
            classification,
            columns,
        }
    }

    /// Lines whose trailing run holds at least two numbers.
    pub fn extract_strict(&self, document: &DocumentText, supplier: &str) -> Vec<LineItem> {
        let items: Vec<LineItem> = document
            .lines()
            .filter_map(|line| self.strict_item(line, supplier))
            .collect();

        debug!("Strict heuristic found {} items", items.len());
        items
    }

    /// Last resort: any line with a number and some text becomes an item
    /// priced at its last number.
    pub fn extract_loose(&self, document: &DocumentText, supplier: &str) -> Vec<LineItem> {
        let items: Vec<LineItem> = document
            .lines()
            .filter_map(|line| self.loose_item(line, supplier))
            .collect();

        debug!("Loose heuristic found {} items", items.len());
        items
    }

    fn strict_item(&self, line: &str, supplier: &str) -> Option<LineItem> {
        let candidate = self.analyze_line(line);
        let columns = match candidate.columns {
            Some(columns) => columns,
            None => {
                if let Classification::Noise(reason) = candidate.classification {
                    trace!("Skipping line ({}): {:?}", reason, candidate.text);
                }
                return None;
            }
        };

        let fields = self.mapper.map(&columns.trailing)?;
        let item = LineItem::new(
            supplier,
            columns.product_name(self.max_name_tokens),
            Some(fields.quantity),
            fields.unit_price,
            Some(fields.total_price),
        )
        .with_product_id(columns.product_id)
        .with_tax(fields.tax_amount);

        trace!("Accepted line {:?} as {:?}", candidate.text, item.product_name);
        Some(item)
    }

    fn loose_item(&self, line: &str, supplier: &str) -> Option<LineItem> {
        let line = line.trim();
        if !self.classifier.classify_loose(line).is_candidate() {
            return None;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let columns = self.inferencer.scatter(&tokens);
        let price = *columns.numbers.last()?;
        if columns.text.is_empty() {
            return None;
        }

        Some(LineItem::new(
            supplier,
            columns.text.join(" "),
            Some(Decimal::ONE),
            price,
            Some(price),
        ))
    }
}

impl Default for HeuristicParser {
    fn default() -> Self {
        Self::new()
    }
}
