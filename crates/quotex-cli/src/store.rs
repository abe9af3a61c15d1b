//! SQLite storage for extracted quotations and their line items.
//!
//! Schema:
//! - quotations: id, filename, upload_date
//! - items: id, quotation_id, supplier/product/sku, quantity, unit and total price
//!
//! Amounts are stored as decimal text so exports read back exactly what was
//! extracted. Tax and transport are not persisted.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use quotex_core::ExtractionResult;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS quotations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    upload_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    quotation_id INTEGER NOT NULL,
    supplier_name TEXT NOT NULL,
    product_name TEXT NOT NULL,
    sku TEXT,
    quantity TEXT NOT NULL,
    unit_price TEXT NOT NULL,
    total_price TEXT NOT NULL,
    FOREIGN KEY (quotation_id) REFERENCES quotations(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_items_quotation_id ON items(quotation_id);
";

const ITEM_COLUMNS: &str =
    "id, quotation_id, supplier_name, product_name, sku, quantity, unit_price, total_price";

/// A stored quotation header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotationRecord {
    pub id: i64,
    pub filename: String,
    pub upload_date: DateTime<Utc>,
}

/// A stored line item in its persisted layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredItem {
    pub id: i64,
    pub quotation_id: i64,
    pub supplier_name: String,
    pub product_name: String,
    pub product_id: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Fields an item edit may change; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub product_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none()
            && self.quantity.is_none()
            && self.unit_price.is_none()
            && self.total_price.is_none()
    }
}

/// Database connection wrapper
pub struct QuotationStore {
    conn: Connection,
}

impl QuotationStore {
    /// Open or create the database at path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        debug!("Opened quotation store at {}", path.display());
        Ok(Self { conn })
    }

    /// Open in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Store a quotation and all of its items in one transaction.
    ///
    /// Returns the quotation ID.
    pub fn save(&mut self, label: &str, result: &ExtractionResult) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO quotations (filename, upload_date) VALUES (?1, ?2)",
            params![label, Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)],
        )?;
        let quotation_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO items (quotation_id, supplier_name, product_name, sku, quantity, unit_price, total_price)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for item in &result.items {
                stmt.execute(params![
                    quotation_id,
                    item.supplier_name,
                    item.product_name,
                    item.product_id,
                    item.effective_quantity().to_string(),
                    item.unit_price.to_string(),
                    item.total_price.to_string(),
                ])?;
            }
        }

        tx.commit().context("Failed to save quotation")?;
        debug!("Saved quotation {} with {} items", quotation_id, result.items.len());
        Ok(quotation_id)
    }

    /// The most recently stored quotation.
    pub fn latest_quotation(&self) -> Result<Option<QuotationRecord>> {
        self.conn
            .query_row(
                "SELECT id, filename, upload_date FROM quotations
                 ORDER BY upload_date DESC, id DESC LIMIT 1",
                [],
                quotation_from_row,
            )
            .optional()
            .context("Failed to get latest quotation")
    }

    pub fn quotation(&self, id: i64) -> Result<Option<QuotationRecord>> {
        self.conn
            .query_row(
                "SELECT id, filename, upload_date FROM quotations WHERE id = ?1",
                params![id],
                quotation_from_row,
            )
            .optional()
            .context("Failed to get quotation")
    }

    /// Items of one quotation in insertion order.
    pub fn items_for(&self, quotation_id: i64) -> Result<Vec<StoredItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM items WHERE quotation_id = ?1 ORDER BY id",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![quotation_id], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn all_items(&self) -> Result<Vec<StoredItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM items ORDER BY id", ITEM_COLUMNS))?;
        let items = stmt
            .query_map([], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn item(&self, id: i64) -> Result<Option<StoredItem>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS),
                params![id],
                item_from_row,
            )
            .optional()
            .context("Failed to get item")
    }

    /// Apply an edit. Returns false when no item has this ID.
    pub fn update_item(&self, id: i64, update: &ItemUpdate) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE items SET
                product_name = COALESCE(?1, product_name),
                quantity = COALESCE(?2, quantity),
                unit_price = COALESCE(?3, unit_price),
                total_price = COALESCE(?4, total_price)
             WHERE id = ?5",
            params![
                update.product_name,
                update.quantity.map(|d| d.to_string()),
                update.unit_price.map(|d| d.to_string()),
                update.total_price.map(|d| d.to_string()),
                id,
            ],
        )?;
        Ok(rows > 0)
    }
}

fn quotation_from_row(row: &Row<'_>) -> rusqlite::Result<QuotationRecord> {
    let raw: String = row.get(2)?;
    let upload_date = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(QuotationRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        upload_date,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<StoredItem> {
    Ok(StoredItem {
        id: row.get(0)?,
        quotation_id: row.get(1)?,
        supplier_name: row.get(2)?,
        product_name: row.get(3)?,
        product_id: row.get(4)?,
        quantity: decimal_column(row, 5)?,
        unit_price: decimal_column(row, 6)?,
        total_price: decimal_column(row, 7)?,
    })
}

fn decimal_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(index)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quotex_core::{DocumentText, ExtractionPipeline};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_result() -> ExtractionResult {
        let doc = DocumentText::from_text(
            "Acme Supply Co.\nABC123 Widget Blue 10 2.50 25.00\nGadget Red 3 1.125 3.375\n",
        )
        .unwrap();
        ExtractionPipeline::new().extract(&doc, None).unwrap()
    }

    #[test]
    fn test_save_and_read_back() {
        let mut store = QuotationStore::in_memory().unwrap();
        let id = store.save("quote.pdf", &sample_result()).unwrap();

        let latest = store.latest_quotation().unwrap().unwrap();
        assert_eq!(latest.id, id);
        assert_eq!(latest.filename, "quote.pdf");

        let items = store.items_for(id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].supplier_name, "Acme Supply Co.");
        assert_eq!(items[0].product_id.as_deref(), Some("ABC123"));
        assert_eq!(items[0].quantity, dec("10"));
        assert_eq!(items[1].product_id, None);
        assert_eq!(items[1].unit_price, dec("1.125"));
        assert_eq!(items[1].total_price, dec("3.375"));
        assert_eq!(items[1].total_price.to_string(), "3.375");
    }

    #[test]
    fn test_latest_is_most_recent_save() {
        let mut store = QuotationStore::in_memory().unwrap();
        assert!(store.latest_quotation().unwrap().is_none());

        store.save("first.pdf", &sample_result()).unwrap();
        let second = store.save("second.pdf", &sample_result()).unwrap();

        assert_eq!(store.latest_quotation().unwrap().unwrap().id, second);
        assert_eq!(store.all_items().unwrap().len(), 4);
        assert_eq!(store.items_for(second).unwrap().len(), 2);
    }

    #[test]
    fn test_update_item_keeps_unset_fields() {
        let mut store = QuotationStore::in_memory().unwrap();
        let id = store.save("quote.pdf", &sample_result()).unwrap();
        let item_id = store.items_for(id).unwrap()[0].id;

        let update = ItemUpdate {
            quantity: Some(dec("12")),
            total_price: Some(dec("30.00")),
            ..ItemUpdate::default()
        };
        assert!(store.update_item(item_id, &update).unwrap());

        let item = store.item(item_id).unwrap().unwrap();
        assert_eq!(item.product_name, "Widget Blue");
        assert_eq!(item.quantity, dec("12"));
        assert_eq!(item.unit_price, dec("2.50"));
        assert_eq!(item.total_price, dec("30.00"));

        assert!(!store.update_item(9999, &update).unwrap());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("quotations.db");
        let mut store = QuotationStore::open(&path).unwrap();
        store.save("quote.pdf", &sample_result()).unwrap();
        assert!(path.exists());

        let reopened = QuotationStore::open(&path).unwrap();
        assert_eq!(reopened.all_items().unwrap().len(), 2);
    }
}
