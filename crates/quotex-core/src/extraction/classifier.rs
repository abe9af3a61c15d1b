//! Line classification: header and metadata noise versus product rows.

use crate::models::config::ExtractionConfig;

/// Keywords of document headers and column titles (uppercase).
pub const HEADER_KEYWORDS: [&str; 23] = [
    "DOCUMENTO",
    "RNC:",
    "CLIENTE:",
    "VENDEDOR:",
    "CONDICION:",
    "VENCE:",
    "HORA:",
    "FECHA:",
    "REFERENCIA:",
    "TELEFONO",
    "TEL:",
    "LOCAL",
    "REPARTO",
    "DIAS",
    "PÁGINA",
    "PAGE",
    "CANT.",
    "PRECIO",
    "DESC.",
    "ITBIS",
    "IMPORTE",
    "DESCRIPCIÓN",
    "DESCRIPCION",
];

/// Prefixes of page/client/salesperson label lines (uppercase).
pub const METADATA_PREFIXES: [&str; 4] = ["PÁGINA", "PAGINA", "CLIENTE:", "VENDEDOR:"];

/// Words that disqualify a line from being the supplier name (uppercase).
pub const SUPPLIER_SKIP_WORDS: [&str; 9] = [
    "FACTURA",
    "QUOTATION",
    "PRESUPUESTO",
    "FECHA",
    "DATE",
    "PAGINA",
    "PAGE",
    "NIT",
    "RUC",
];

/// Why a line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseReason {
    /// Empty or below the minimum length.
    TooShort,
    /// A header keyword dominates a short line.
    HeaderKeyword(&'static str),
    /// Starts with a metadata label.
    MetadataPrefix(&'static str),
    /// Too few tokens for description plus numeric columns.
    TooSparse,
}

impl std::fmt::Display for NoiseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoiseReason::TooShort => write!(f, "too short"),
            NoiseReason::HeaderKeyword(keyword) => write!(f, "header keyword {}", keyword),
            NoiseReason::MetadataPrefix(prefix) => write!(f, "metadata prefix {}", prefix),
            NoiseReason::TooSparse => write!(f, "too few tokens"),
        }
    }
}

/// Outcome of classifying one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Noise(NoiseReason),
    Candidate,
}

impl Classification {
    pub fn is_candidate(&self) -> bool {
        matches!(self, Classification::Candidate)
    }
}

/// Decides whether a raw line may hold a product row.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    min_line_length: usize,
    header_max_length: usize,
    min_tokens: usize,
}

impl LineClassifier {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_line_length: config.min_line_length,
            header_max_length: config.header_max_length,
            min_tokens: config.min_tokens,
        }
    }

    /// Classify a line for the strict heuristic.
    pub fn classify(&self, line: &str) -> Classification {
        let line = line.trim();
        let length = line.chars().count();
        if length < self.min_line_length {
            return Classification::Noise(NoiseReason::TooShort);
        }

        let upper = line.to_uppercase();
        if length < self.header_max_length {
            if let Some(keyword) = find_header_keyword(&upper) {
                return Classification::Noise(NoiseReason::HeaderKeyword(keyword));
            }
        }

        if let Some(prefix) = METADATA_PREFIXES.iter().copied().find(|p| upper.starts_with(*p)) {
            return Classification::Noise(NoiseReason::MetadataPrefix(prefix));
        }

        if line.split_whitespace().count() < self.min_tokens {
            return Classification::Noise(NoiseReason::TooSparse);
        }

        Classification::Candidate
    }

    /// Classify a line for the loose fallback: length check plus header
    /// keywords at any line length.
    pub fn classify_loose(&self, line: &str) -> Classification {
        let line = line.trim();
        if line.chars().count() < self.min_line_length {
            return Classification::Noise(NoiseReason::TooShort);
        }

        match find_header_keyword(&line.to_uppercase()) {
            Some(keyword) => Classification::Noise(NoiseReason::HeaderKeyword(keyword)),
            None => Classification::Candidate,
        }
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn find_header_keyword(upper: &str) -> Option<&'static str> {
    HEADER_KEYWORDS.iter().copied().find(|keyword| upper.contains(*keyword))
}

/// Pick the supplier name from the head of the document.
///
/// The first of the leading `scan_lines` lines that is longer than three
/// characters and free of skip words wins. Stylized names (e.g. containing
/// `NIT` inside a longer word) are skipped, which can misattribute the
/// document.
pub fn detect_supplier<S: AsRef<str>>(lines: &[S], scan_lines: usize) -> Option<String> {
    lines.iter().take(scan_lines).find_map(|line| {
        let trimmed = line.as_ref().trim();
        let upper = trimmed.to_uppercase();
        let plausible = trimmed.chars().count() > 3
            && !SUPPLIER_SKIP_WORDS.iter().any(|word| upper.contains(word));
        plausible.then(|| trimmed.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_product_row_is_candidate() {
        let classifier = LineClassifier::new();
        assert_eq!(
            classifier.classify("Widget Blue 10 2.50 25.00"),
            Classification::Candidate
        );
    }

    #[test]
    fn test_short_lines_are_noise() {
        let classifier = LineClassifier::new();
        assert_eq!(classifier.classify(""), Classification::Noise(NoiseReason::TooShort));
        assert_eq!(classifier.classify("   "), Classification::Noise(NoiseReason::TooShort));
        assert_eq!(classifier.classify("A 1 2"), Classification::Noise(NoiseReason::TooShort));
    }

    #[test]
    fn test_short_header_is_noise() {
        let classifier = LineClassifier::new();
        assert_eq!(
            classifier.classify("CANT. DESCRIPCION PRECIO IMPORTE"),
            Classification::Noise(NoiseReason::HeaderKeyword("CANT."))
        );
        assert_eq!(
            classifier.classify("Tel: 809-555-0101 ext 4"),
            Classification::Noise(NoiseReason::HeaderKeyword("TEL:"))
        );
    }

    #[test]
    fn test_keyword_inside_long_description_is_kept() {
        let classifier = LineClassifier::new();
        let line = "Cable de red categoria 6 para instalacion LOCAL exterior 20 1.50 30.00";
        assert!(line.chars().count() >= 60);
        assert_eq!(classifier.classify(line), Classification::Candidate);
    }

    #[test]
    fn test_metadata_prefix_is_noise() {
        let classifier = LineClassifier::new();
        let line = "Página 1 de 3 de este documento comercial impreso por el sistema de ventas";
        assert_eq!(
            classifier.classify(line),
            Classification::Noise(NoiseReason::MetadataPrefix("PÁGINA"))
        );
    }

    #[test]
    fn test_sparse_line_is_noise() {
        let classifier = LineClassifier::new();
        assert_eq!(
            classifier.classify("Screwdriver 12.50"),
            Classification::Noise(NoiseReason::TooSparse)
        );
    }

    #[test]
    fn test_loose_ignores_token_count_but_not_keywords() {
        let classifier = LineClassifier::new();
        assert_eq!(classifier.classify_loose("Screwdriver 12.50"), Classification::Candidate);

        let long_header =
            "Precio sujeto a cambio sin previo aviso segun condiciones del proveedor 10.00";
        assert!(long_header.chars().count() >= 60);
        assert_eq!(
            classifier.classify_loose(long_header),
            Classification::Noise(NoiseReason::HeaderKeyword("PRECIO"))
        );
    }

    #[test]
    fn test_classification_is_idempotent() {
        let classifier = LineClassifier::new();
        for line in ["Widget Blue 10 2.50 25.00", "FECHA: 01/02/2024", "", "Screwdriver 12.50"] {
            assert_eq!(classifier.classify(line), classifier.classify(line));
            assert_eq!(classifier.classify_loose(line), classifier.classify_loose(line));
        }
    }

    #[test]
    fn test_detect_supplier_skips_header_lines() {
        let lines = ["", "COTIZACION / QUOTATION", "Fecha: 2024-03-01", "Acme Supply Co.", "Widget 1 2"];
        assert_eq!(detect_supplier(&lines, 15), Some("Acme Supply Co.".to_string()));
    }

    #[test]
    fn test_detect_supplier_respects_scan_window() {
        let lines = ["abc", "", "Late Supplier Ltd"];
        assert_eq!(detect_supplier(&lines, 2), None);
        assert_eq!(detect_supplier(&lines, 3), Some("Late Supplier Ltd".to_string()));
    }

    #[test]
    fn test_detect_supplier_substring_skip_misses_stylized_names() {
        let lines = ["UNITED TOOLS", "Backup Trading"];
        assert_eq!(detect_supplier(&lines, 15), Some("Backup Trading".to_string()));
    }
}
