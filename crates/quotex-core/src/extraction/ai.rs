//! Contract with a generative-AI text service and parsing of its replies.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::debug;

use super::numeric::parse_amount;
use crate::error::AiError;
use crate::models::quotation::LineItem;

/// Name used for items the service returns without a supplier or product.
pub const UNKNOWN_NAME: &str = "Unknown";

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)(?:```|\z)").unwrap();
}

/// A service that turns a prompt into free-form text.
///
/// Implementations perform the network exchange; every failure is reported
/// as an [`AiError`] so the pipeline can fall through to the heuristics.
pub trait AiExtractor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Send `prompt` authenticated with `credential` and return the reply text.
    fn complete(&self, prompt: &str, credential: &str) -> Result<String, AiError>;
}

/// Build the structured-extraction instruction for a document.
pub fn build_prompt(text: &str) -> String {
    format!(
        "You are reading the text of a supplier price quotation. Extract every product \
         or service line item and answer with JSON only, no commentary.\n\
         \n\
         Use this shape: {{\"items\": [ ... ]}} where each element has the fields\n\
         - supplier_name: company issuing the quotation\n\
         - product_name: description of the product or service\n\
         - product_id: product code, SKU or part number\n\
         - quantity: number of units\n\
         - unit_price: price of one unit\n\
         - tax_amount: tax charged on the line\n\
         - transport_cost: transport or shipping charged on the line\n\
         - total_price: total of the line\n\
         \n\
         Write amounts as plain numbers without currency symbols. Use null for any \
         value the document does not state. Do not return an empty items array; \
         include every line that carries a price.\n\
         \n\
         Quotation text:\n{}",
        text
    )
}

/// Return the content of the first markdown code fence, or the trimmed input
/// when there is none. An unterminated fence runs to the end of the text.
pub fn strip_code_fence(content: &str) -> &str {
    match CODE_FENCE.captures(content).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => content.trim(),
    }
}

/// Parse a service reply into line items.
///
/// Accepts `{"items": [...]}` or a bare array. Non-object elements and
/// elements whose line total cannot be represented are skipped; numeric
/// fields given as strings go through [`parse_amount`].
pub fn parse_response(content: &str) -> Result<Vec<LineItem>, AiError> {
    let body = strip_code_fence(content);
    let value: Value =
        serde_json::from_str(body).map_err(|e| AiError::MalformedResponse(e.to_string()))?;

    let elements = match value {
        Value::Array(elements) => elements,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(elements)) => elements,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(AiError::MalformedResponse(
                    "`items` is not an array".to_string(),
                ));
            }
        },
        _ => {
            return Err(AiError::MalformedResponse(
                "expected a JSON object or array".to_string(),
            ));
        }
    };

    let total = elements.len();
    let items: Vec<LineItem> = elements
        .iter()
        .filter_map(Value::as_object)
        .filter_map(item_from_object)
        .collect();

    if items.len() < total {
        debug!("Skipped {} unusable elements in AI reply", total - items.len());
    }

    if items.is_empty() {
        return Err(AiError::EmptyItems);
    }
    Ok(items)
}

fn item_from_object(object: &Map<String, Value>) -> Option<LineItem> {
    let supplier = text_field(object, "supplier_name").unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let product = text_field(object, "product_name").unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let quantity = decimal_field(object, "quantity");
    let unit_price = decimal_field(object, "unit_price").unwrap_or(Decimal::ZERO);
    let total_price = LineItem::derive_total(quantity, unit_price, decimal_field(object, "total_price"));

    if total_price.is_none() {
        debug!("Dropping AI item {:?}: line total overflows", product);
        return None;
    }

    Some(
        LineItem::new(supplier, product, quantity, unit_price, total_price)
            .with_product_id(text_field(object, "product_id"))
            .with_tax(decimal_field(object, "tax_amount"))
            .with_transport(decimal_field(object, "transport_cost")),
    )
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match object.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn decimal_field(object: &Map<String, Value>, key: &str) -> Option<Decimal> {
    match object.get(key)? {
        Value::Number(n) => {
            let repr = n.to_string();
            Decimal::from_str(&repr)
                .or_else(|_| Decimal::from_scientific(&repr))
                .ok()
        }
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_prompt_embeds_text_and_fields() {
        let prompt = build_prompt("Widget Blue 10 2.50 25.00");
        assert!(prompt.ends_with("Widget Blue 10 2.50 25.00"));
        for field in [
            "supplier_name",
            "product_name",
            "product_id",
            "quantity",
            "unit_price",
            "tax_amount",
            "transport_cost",
            "total_price",
        ] {
            assert!(prompt.contains(field), "missing {}", field);
        }
        assert!(prompt.contains("\"items\""));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"items\": []}\n```"), "{\"items\": []}");
        assert_eq!(strip_code_fence("Here you go:\n```\n[1]\n```\nThanks"), "[1]");
        assert_eq!(strip_code_fence("```JSON\n[2]"), "[2]");
        assert_eq!(strip_code_fence("  {\"items\": []}  "), "{\"items\": []}");
    }

    #[test]
    fn test_parse_items_object() {
        let reply = r#"```json
{"items": [
  {"supplier_name": "Acme Supply Co.", "product_name": "Widget Blue", "product_id": "ABC123",
   "quantity": 10, "unit_price": 2.5, "tax_amount": null, "transport_cost": 3, "total_price": 25.0}
]}
```"#;
        let items = parse_response(reply).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.supplier_name, "Acme Supply Co.");
        assert_eq!(item.product_id.as_deref(), Some("ABC123"));
        assert_eq!(item.quantity, Some(dec("10")));
        assert_eq!(item.unit_price, dec("2.5"));
        assert_eq!(item.tax_amount, None);
        assert_eq!(item.transport_cost, Some(dec("3")));
        assert_eq!(item.total_price, dec("25"));
    }

    #[test]
    fn test_parse_bare_array_with_string_amounts() {
        let reply = r#"[{"product_name": "Cemento gris", "quantity": "10", "unit_price": "450,00",
                        "total_price": "4.500,00", "product_id": 7731}, "noise", 4]"#;
        let items = parse_response(reply).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].supplier_name, UNKNOWN_NAME);
        assert_eq!(items[0].unit_price, dec("450.00"));
        assert_eq!(items[0].total_price, dec("4500.00"));
        assert_eq!(items[0].product_id.as_deref(), Some("7731"));
    }

    #[test]
    fn test_missing_total_is_derived() {
        let items =
            parse_response(r#"{"items": [{"product_name": "Guantes", "quantity": 3, "unit_price": 4}]}"#)
                .unwrap();
        assert_eq!(items[0].total_price, dec("12"));

        let items = parse_response(r#"[{"product_name": "Guantes", "unit_price": 4, "total_price": 0}]"#)
            .unwrap();
        assert_eq!(items[0].quantity, None);
        assert_eq!(items[0].total_price, dec("4"));
    }

    #[test]
    fn test_overflowing_item_is_dropped() {
        let items = parse_response(
            r#"[{"product_name": "Huge", "quantity": 1e15, "unit_price": 1e15, "total_price": null},
                {"product_name": "Guantes", "quantity": 3, "unit_price": 4}]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "Guantes");

        assert_eq!(
            parse_response(r#"{"items": [{"quantity": 1e15, "unit_price": 1e15}]}"#),
            Err(AiError::EmptyItems)
        );
    }

    #[test]
    fn test_unparseable_reply() {
        assert!(matches!(
            parse_response("I could not find any items."),
            Err(AiError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(r#"{"items": "none"}"#),
            Err(AiError::MalformedResponse(_))
        ));
        assert!(matches!(parse_response("42"), Err(AiError::MalformedResponse(_))));
    }

    #[test]
    fn test_empty_items() {
        assert_eq!(parse_response(r#"{"items": []}"#), Err(AiError::EmptyItems));
        assert_eq!(parse_response(r#"{"result": 1}"#), Err(AiError::EmptyItems));
        assert_eq!(parse_response(r#"["a", 1, null]"#), Err(AiError::EmptyItems));
    }
}
