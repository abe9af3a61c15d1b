//! Quotation line items and extraction results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Supplier label used when no plausible supplier line is found.
pub const UNKNOWN_SUPPLIER: &str = "Unknown Supplier";

/// A single normalized line item of a price quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Supplier the quotation comes from.
    pub supplier_name: String,

    /// Product description.
    pub product_name: String,

    /// Product code (SKU, part number).
    #[serde(default)]
    pub product_id: Option<String>,

    /// Quantity; `None` means the source did not state one.
    #[serde(default)]
    pub quantity: Option<Decimal>,

    /// Price of a single unit.
    #[serde(default)]
    pub unit_price: Decimal,

    /// Tax amount for the line.
    #[serde(default)]
    pub tax_amount: Option<Decimal>,

    /// Transport cost, only ever provided by the AI path.
    #[serde(default)]
    pub transport_cost: Option<Decimal>,

    /// Total for the line.
    #[serde(default)]
    pub total_price: Decimal,
}

impl LineItem {
    /// Line total: the stated total when present and non-zero, otherwise
    /// quantity (default one) times unit price. `None` when that product
    /// does not fit in a `Decimal`.
    pub fn derive_total(
        quantity: Option<Decimal>,
        unit_price: Decimal,
        total_price: Option<Decimal>,
    ) -> Option<Decimal> {
        match total_price {
            Some(total) if !total.is_zero() => Some(total),
            _ => quantity.unwrap_or(Decimal::ONE).checked_mul(unit_price),
        }
    }

    /// Build a line item, deriving the total from quantity and unit price
    /// when it is absent or zero. An overflowing product falls back to the
    /// unit price.
    pub fn new(
        supplier_name: impl Into<String>,
        product_name: impl Into<String>,
        quantity: Option<Decimal>,
        unit_price: Decimal,
        total_price: Option<Decimal>,
    ) -> Self {
        let total_price = Self::derive_total(quantity, unit_price, total_price).unwrap_or_else(|| {
            warn!(
                "Line total overflows for quantity {:?} x {}, keeping unit price",
                quantity, unit_price
            );
            unit_price
        });

        Self {
            supplier_name: supplier_name.into(),
            product_name: product_name.into(),
            product_id: None,
            quantity,
            unit_price,
            tax_amount: None,
            transport_cost: None,
            total_price,
        }
    }

    pub fn with_product_id(mut self, product_id: Option<String>) -> Self {
        self.product_id = product_id;
        self
    }

    pub fn with_tax(mut self, tax_amount: Option<Decimal>) -> Self {
        self.tax_amount = tax_amount;
        self
    }

    pub fn with_transport(mut self, transport_cost: Option<Decimal>) -> Self {
        self.transport_cost = transport_cost;
        self
    }

    /// Quantity with the documented default of one applied.
    pub fn effective_quantity(&self) -> Decimal {
        self.quantity.unwrap_or(Decimal::ONE)
    }
}

/// The extraction approach that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// External AI text-to-structured-data service.
    Llm,
    /// Trailing-column heuristic requiring at least two numbers per line.
    HeuristicStrict,
    /// Last-resort heuristic taking any numeric token on a line.
    HeuristicLoose,
}

impl Strategy {
    /// Tier tried after this one came back empty.
    pub fn fallback(self) -> Option<Self> {
        match self {
            Strategy::Llm => Some(Strategy::HeuristicStrict),
            Strategy::HeuristicStrict => Some(Strategy::HeuristicLoose),
            Strategy::HeuristicLoose => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Llm => "llm",
            Strategy::HeuristicStrict => "heuristic-strict",
            Strategy::HeuristicLoose => "heuristic-loose",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one tier the pipeline ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAttempt {
    pub strategy: Strategy,
    pub items_found: usize,
    /// Why the tier produced nothing, when it failed outright.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Line items extracted from one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted items in document order.
    pub items: Vec<LineItem>,

    /// Tier that produced the items.
    pub strategy: Strategy,

    /// Supplier detected by the heuristic scan of the document head.
    pub supplier_name: String,

    /// Every tier attempted, in order.
    pub attempts: Vec<TierAttempt>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line totals, saturating at the `Decimal` bounds.
    pub fn grand_total(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ZERO, |sum, item| sum.saturating_add(item.total_price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_total_derived_when_absent() {
        let item = LineItem::new("Acme", "Bolt", Some(dec("4")), dec("2.50"), None);
        assert_eq!(item.total_price, dec("10.00"));
    }

    #[test]
    fn test_total_derived_when_zero() {
        let item = LineItem::new("Acme", "Bolt", Some(dec("3")), dec("1.10"), Some(Decimal::ZERO));
        assert_eq!(item.total_price, dec("3.30"));
    }

    #[test]
    fn test_overflowing_total_keeps_unit_price() {
        let huge = dec("1000000000000000");
        assert_eq!(LineItem::derive_total(Some(huge), huge, None), None);

        let item = LineItem::new("Acme", "Bolt", Some(huge), huge, None);
        assert_eq!(item.total_price, huge);
    }

    #[test]
    fn test_grand_total_saturates() {
        let item = LineItem::new("Acme", "Bolt", None, Decimal::MAX, None);
        let result = ExtractionResult {
            items: vec![item.clone(), item],
            strategy: Strategy::Llm,
            supplier_name: "Acme".to_string(),
            attempts: Vec::new(),
            processing_time_ms: 0,
        };
        assert_eq!(result.grand_total(), Decimal::MAX);
    }

    #[test]
    fn test_total_kept_when_supplied() {
        let item = LineItem::new("Acme", "Bolt", Some(dec("3")), dec("1.10"), Some(dec("3.00")));
        assert_eq!(item.total_price, dec("3.00"));
    }

    #[test]
    fn test_missing_quantity_defaults_to_one() {
        let item = LineItem::new("Acme", "Bolt", None, dec("7.25"), None);
        assert_eq!(item.quantity, None);
        assert_eq!(item.effective_quantity(), Decimal::ONE);
        assert_eq!(item.total_price, dec("7.25"));
    }

    #[test]
    fn test_strategy_fallback_order() {
        assert_eq!(Strategy::Llm.fallback(), Some(Strategy::HeuristicStrict));
        assert_eq!(Strategy::HeuristicStrict.fallback(), Some(Strategy::HeuristicLoose));
        assert_eq!(Strategy::HeuristicLoose.fallback(), None);
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&Strategy::HeuristicStrict).unwrap();
        assert_eq!(json, "\"heuristic-strict\"");
        let parsed: Strategy = serde_json::from_str("\"llm\"").unwrap();
        assert_eq!(parsed, Strategy::Llm);
    }
}
