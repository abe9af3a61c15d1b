//! Tabular rendering of stored and freshly extracted line items.

use clap::ValueEnum;

use quotex_core::{ExtractionResult, LineItem};

use crate::store::StoredItem;

/// Header of the export table, in column order.
pub const EXPORT_HEADER: [&str; 8] = [
    "ID",
    "Quotation ID",
    "Supplier",
    "Product Name",
    "Product ID",
    "Quantity",
    "Unit Price",
    "Total Price",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// Tab-separated values, for spreadsheet import
    Tsv,
    /// JSON array
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

/// Render stored items. Decimals keep their full textual precision.
pub fn render_stored(items: &[StoredItem], format: ExportFormat) -> anyhow::Result<String> {
    let delimiter = match format {
        ExportFormat::Json => return Ok(serde_json::to_string_pretty(items)?),
        ExportFormat::Csv => b',',
        ExportFormat::Tsv => b'\t',
    };

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(vec![]);
    wtr.write_record(EXPORT_HEADER)?;

    for item in items {
        wtr.write_record([
            item.id.to_string(),
            item.quotation_id.to_string(),
            item.supplier_name.clone(),
            item.product_name.clone(),
            item.product_id.clone().unwrap_or_default(),
            item.quantity.to_string(),
            item.unit_price.to_string(),
            item.total_price.to_string(),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

/// CSV of an extraction result with every line-item field.
pub fn result_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "supplier_name",
        "product_name",
        "product_id",
        "quantity",
        "unit_price",
        "tax_amount",
        "transport_cost",
        "total_price",
    ])?;

    for item in &result.items {
        wtr.write_record([
            item.supplier_name.clone(),
            item.product_name.clone(),
            item.product_id.clone().unwrap_or_default(),
            optional(item.quantity),
            item.unit_price.to_string(),
            optional(item.tax_amount),
            optional(item.transport_cost),
            item.total_price.to_string(),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

/// Plain text summary of an extraction result.
pub fn result_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Supplier: {}\n", result.supplier_name));
    output.push_str(&format!("Strategy: {}\n", result.strategy));
    output.push_str(&format!("Items:    {}\n", result.items.len()));
    output.push('\n');

    for (index, item) in result.items.iter().enumerate() {
        output.push_str(&item_line(index + 1, item));
    }

    output.push('\n');
    output.push_str(&format!("Total: {}\n", result.grand_total()));
    output
}

fn item_line(number: usize, item: &LineItem) -> String {
    let id = item
        .product_id
        .as_deref()
        .map(|id| format!(" [{}]", id))
        .unwrap_or_default();
    let tax = item
        .tax_amount
        .map(|tax| format!(" (tax {})", tax))
        .unwrap_or_default();

    format!(
        "{:>3}. {}{}\n     {} x {} = {}{}\n",
        number,
        item.product_name,
        id,
        item.effective_quantity(),
        item.unit_price,
        item.total_price,
        tax
    )
}

fn optional(value: Option<rust_decimal::Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quotex_core::{DocumentText, ExtractionPipeline};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn stored(id: i64, product_name: &str, total: &str) -> StoredItem {
        StoredItem {
            id,
            quotation_id: 7,
            supplier_name: "Acme, Inc.".to_string(),
            product_name: product_name.to_string(),
            product_id: None,
            quantity: Decimal::ONE,
            unit_price: Decimal::from_str(total).unwrap(),
            total_price: Decimal::from_str(total).unwrap(),
        }
    }

    #[test]
    fn test_csv_export_quotes_and_keeps_precision() {
        let items = [stored(1, "Widget", "0.123456789")];
        let csv = render_stored(&items, ExportFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "ID,Quotation ID,Supplier,Product Name,Product ID,Quantity,Unit Price,Total Price\n\
             1,7,\"Acme, Inc.\",Widget,,1,0.123456789,0.123456789\n"
        );
    }

    #[test]
    fn test_tsv_export() {
        let items = [stored(2, "Gadget", "4.50")];
        let tsv = render_stored(&items, ExportFormat::Tsv).unwrap();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines[0].split('\t').count(), 8);
        assert_eq!(lines[1], "2\t7\tAcme, Inc.\tGadget\t\t1\t4.50\t4.50");
    }

    #[test]
    fn test_json_export_keeps_decimal_text() {
        let items = [stored(3, "Bolt", "1.10")];
        let json = render_stored(&items, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["total_price"], "1.10");
        assert_eq!(value[0]["product_id"], serde_json::Value::Null);
    }

    #[test]
    fn test_result_renderings() {
        let doc = DocumentText::from_text("Acme Supply Co.\nABC123 Widget Blue 10 2.50 25.00\n").unwrap();
        let result = ExtractionPipeline::new().extract(&doc, None).unwrap();

        let csv = result_csv(&result).unwrap();
        assert_eq!(
            csv.lines().nth(1),
            Some("Acme Supply Co.,Widget Blue,ABC123,10,2.50,,,25.00")
        );

        let text = result_text(&result);
        assert!(text.contains("Strategy: heuristic-strict"));
        assert!(text.contains("Widget Blue [ABC123]"));
        assert!(text.contains("10 x 2.50 = 25.00"));
        assert!(text.ends_with("Total: 25.00\n"));
    }
}
