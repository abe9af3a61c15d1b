//! Right-to-left column inference over a tokenized line.

use rust_decimal::Decimal;

use super::numeric::NumericToken;
use crate::models::config::ExtractionConfig;

/// Position of the right-to-left scan. The transition is one-way: once
/// text is seen, every token further left is description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ScanningNumbers,
    ScanningText,
}

/// A line split into leading description and trailing numeric columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferredColumns {
    /// Tokens left of the trailing numeric run, in line order.
    pub descriptive: Vec<String>,
    /// The maximal suffix of in-range numbers, in line order.
    pub trailing: Vec<Decimal>,
    /// First descriptive token mixing digits and letters.
    pub product_id: Option<String>,
}

impl InferredColumns {
    /// Join the descriptive tokens other than the product id.
    ///
    /// Falls back to all descriptive tokens when the id was the only one.
    pub fn product_name(&self, max_tokens: usize) -> String {
        let id_index = self
            .product_id
            .as_ref()
            .and_then(|id| self.descriptive.iter().position(|t| t == id));

        let rest: Vec<&str> = self
            .descriptive
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != id_index)
            .map(|(_, t)| t.as_str())
            .collect();

        let words: Vec<&str> = if rest.is_empty() {
            self.descriptive.iter().map(String::as_str).collect()
        } else {
            rest
        };

        words
            .into_iter()
            .take(max_tokens)
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

/// Every in-range number of a line regardless of position, plus the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScatteredColumns {
    pub numbers: Vec<Decimal>,
    pub text: Vec<String>,
}

/// Splits candidate lines into description and numeric columns.
#[derive(Debug, Clone)]
pub struct ColumnInferencer {
    max_amount: Decimal,
}

impl ColumnInferencer {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            max_amount: Decimal::from(config.max_amount),
        }
    }

    /// Scan tokens from last to first, collecting the trailing numeric run.
    pub fn infer<S: AsRef<str>>(&self, tokens: &[S]) -> InferredColumns {
        let mut state = ScanState::ScanningNumbers;
        let mut trailing = Vec::new();
        let mut descriptive = Vec::new();

        for token in tokens.iter().rev().map(|t| t.as_ref()) {
            state = match state {
                ScanState::ScanningNumbers => {
                    match NumericToken::parse(token).in_range(self.max_amount) {
                        Some(value) => {
                            trailing.push(value);
                            ScanState::ScanningNumbers
                        }
                        None => {
                            descriptive.push(token.to_string());
                            ScanState::ScanningText
                        }
                    }
                }
                ScanState::ScanningText => {
                    descriptive.push(token.to_string());
                    ScanState::ScanningText
                }
            };
        }

        trailing.reverse();
        descriptive.reverse();

        let product_id = descriptive
            .iter()
            .find(|token| looks_like_product_id(token))
            .cloned();

        InferredColumns {
            descriptive,
            trailing,
            product_id,
        }
    }

    /// Partition tokens into in-range numbers and text, ignoring position.
    pub fn scatter<S: AsRef<str>>(&self, tokens: &[S]) -> ScatteredColumns {
        let mut columns = ScatteredColumns::default();
        for token in tokens.iter().map(|t| t.as_ref()) {
            match NumericToken::parse(token).in_range(self.max_amount) {
                Some(value) => columns.numbers.push(value),
                None => columns.text.push(token.to_string()),
            }
        }
        columns
    }
}

impl Default for ColumnInferencer {
    fn default() -> Self {
        Self::new()
    }
}

fn looks_like_product_id(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit()) && token.chars().any(char::is_alphabetic)
}
