//! Positional mapping of trailing numbers to line-item fields.

use rust_decimal::Decimal;

use crate::models::config::ExtractionConfig;

/// Semantic fields recovered from a trailing numeric run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedFields {
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_amount: Option<Decimal>,
    pub total_price: Decimal,
}

/// Maps the count of trailing numbers to quantity, price, tax and total.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    max_quantity: Decimal,
}

impl FieldMapper {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            max_quantity: Decimal::from(config.max_quantity),
        }
    }

    /// Apply the column convention for the number count.
    ///
    /// Returns `None` for fewer than two numbers. With five or more, the
    /// third column is a discount and is dropped.
    pub fn map(&self, numbers: &[Decimal]) -> Option<MappedFields> {
        let mapped = match *numbers {
            [quantity, unit_price, _discount, tax, total, ..] => MappedFields {
                quantity,
                unit_price,
                tax_amount: Some(tax),
                total_price: total,
            },
            [quantity, unit_price, tax, total] => MappedFields {
                quantity,
                unit_price,
                tax_amount: Some(tax),
                total_price: total,
            },
            [quantity, unit_price, total] => MappedFields {
                quantity,
                unit_price,
                tax_amount: None,
                total_price: total,
            },
            [unit_price, total] => MappedFields {
                quantity: Decimal::ONE,
                unit_price,
                tax_amount: None,
                total_price: total,
            },
            _ => return None,
        };

        Some(self.clamp_quantity(mapped))
    }

    fn clamp_quantity(&self, mut fields: MappedFields) -> MappedFields {
        if fields.quantity > self.max_quantity {
            fields.quantity = Decimal::ONE;
        }
        fields
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}
