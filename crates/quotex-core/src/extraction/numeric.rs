//! Locale-aware parsing of numeric tokens.
//!
//! Quotations mix regional conventions, so `1.234,56` and `1,234.56` must
//! both read as 1234.56. The separator occurring last wins as the decimal
//! point; a lone comma is resolved by the number of digits after it.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Currency markers stripped before parsing (matched on the uppercased token).
const CURRENCY_MARKERS: [&str; 5] = ["$", "€", "S/", "USD", "EUR"];

/// How the separators of a token were interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleRule {
    /// Only dots or no separator at all.
    Plain,
    /// `1.234,56`: dots group thousands, the trailing comma is decimal.
    DotGroupingCommaDecimal,
    /// `1,234.56`: commas group thousands, the trailing dot is decimal.
    CommaGroupingDotDecimal,
    /// `123,45`: exactly two digits after the only comma kind.
    CommaDecimal,
    /// `123,456`: exactly three digits after the last comma.
    CommaGrouping,
    /// Any other digit count after a comma; read as decimal.
    CommaDecimalFallback,
}

/// A raw token together with its parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericToken {
    pub raw: String,
    pub value: Option<Decimal>,
    pub rule: LocaleRule,
}

impl NumericToken {
    /// Parse a token. Never fails: unreadable input yields `value: None`.
    pub fn parse(raw: &str) -> Self {
        let (value, rule) = match normalize(raw) {
            Some((normalized, rule)) => (to_decimal(&normalized), rule),
            None => (None, LocaleRule::Plain),
        };

        Self {
            raw: raw.to_string(),
            value,
            rule,
        }
    }

    /// The value if it lies strictly between zero and `upper`.
    pub fn in_range(&self, upper: Decimal) -> Option<Decimal> {
        self.value.filter(|v| *v > Decimal::ZERO && *v < upper)
    }
}

/// Parse a single token into a number, resolving locale ambiguity.
///
/// Returns `None` for empty or non-numeric input.
pub fn parse_amount(token: &str) -> Option<Decimal> {
    NumericToken::parse(token).value
}

fn normalize(token: &str) -> Option<(String, LocaleRule)> {
    let mut cleaned = token.to_uppercase();
    for marker in CURRENCY_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.retain(|c| !c.is_whitespace());

    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => (
            cleaned.replace('.', "").replace(',', "."),
            LocaleRule::DotGroupingCommaDecimal,
        ),
        (Some(_), Some(_)) => (cleaned.replace(',', ""), LocaleRule::CommaGroupingDotDecimal),
        (Some(comma), None) => match cleaned[comma + 1..].chars().count() {
            2 => (cleaned.replace(',', "."), LocaleRule::CommaDecimal),
            3 => (cleaned.replace(',', ""), LocaleRule::CommaGrouping),
            _ => (cleaned.replace(',', "."), LocaleRule::CommaDecimalFallback),
        },
        (None, _) => (cleaned, LocaleRule::Plain),
    };

    Some(normalized)
}

/// Strict decimal conversion: optional sign, digits, at most one dot.
fn to_decimal(s: &str) -> Option<Decimal> {
    let (negative, unsigned) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }

    let body = unsigned.trim_end_matches('.');
    let body = if body.starts_with('.') {
        format!("0{}", body)
    } else {
        body.to_string()
    };

    let value = Decimal::from_str(&body).ok()?;
    Some(if negative { -value } else { value })
}
