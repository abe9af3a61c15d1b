//! Tiered extraction: AI service first, then strict and loose heuristics.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::ai::{AiExtractor, build_prompt, parse_response};
use super::document::DocumentText;
use super::heuristic::HeuristicParser;
use super::{ItemExtractor, Result};
use crate::error::{AiError, ExtractionError};
use crate::models::config::QuotexConfig;
use crate::models::quotation::{ExtractionResult, LineItem, Strategy, TierAttempt};

/// Runs the strategy tiers in order and returns the first non-empty result.
pub struct ExtractionPipeline {
    heuristic: HeuristicParser,
    ai: Option<Box<dyn AiExtractor>>,
    ai_enabled: bool,
    min_credential_length: usize,
}

impl ExtractionPipeline {
    /// Create a heuristic-only pipeline with default settings.
    pub fn new() -> Self {
        Self::from_config(&QuotexConfig::default())
    }

    pub fn from_config(config: &QuotexConfig) -> Self {
        Self {
            heuristic: HeuristicParser::from_config(&config.extraction),
            ai: None,
            ai_enabled: config.ai.enabled,
            min_credential_length: config.ai.min_credential_length,
        }
    }

    /// Attach the AI collaborator used for the first tier.
    pub fn with_ai_extractor(mut self, extractor: Box<dyn AiExtractor>) -> Self {
        self.ai = Some(extractor);
        self
    }

    /// Set the minimum trimmed credential length that enables the AI tier.
    pub fn with_min_credential_length(mut self, length: usize) -> Self {
        self.min_credential_length = length;
        self
    }

    pub fn heuristic(&self) -> &HeuristicParser {
        &self.heuristic
    }

    /// Whether the AI tier would run for this credential.
    pub fn ai_usable(&self, credential: Option<&str>) -> bool {
        self.ai_enabled
            && self.ai.is_some()
            && credential
                .map(str::trim)
                .is_some_and(|c| c.chars().count() >= self.min_credential_length)
    }

    /// Join page texts and extract.
    pub fn extract_pages<S: AsRef<str>>(
        &self,
        pages: &[S],
        credential: Option<&str>,
    ) -> Result<ExtractionResult> {
        let document = DocumentText::from_pages(pages)?;
        self.extract(&document, credential)
    }

    /// Extract line items, degrading through the tiers.
    ///
    /// Fails only when every tier came back empty.
    pub fn extract(
        &self,
        document: &DocumentText,
        credential: Option<&str>,
    ) -> Result<ExtractionResult> {
        let start = (!cfg!(target_arch = "wasm32")).then(Instant::now);
        let supplier = self.heuristic.supplier(document);
        debug!(
            "Extracting from {} lines, supplier {:?}",
            document.line_count(),
            supplier
        );

        let mut attempts = Vec::new();
        let mut tier = Some(if self.ai_usable(credential) {
            Strategy::Llm
        } else {
            Strategy::HeuristicStrict
        });

        while let Some(strategy) = tier {
            match self.run_tier(strategy, document, &supplier, credential) {
                Ok(items) if !items.is_empty() => {
                    attempts.push(TierAttempt {
                        strategy,
                        items_found: items.len(),
                        failure: None,
                    });
                    let processing_time_ms =
                        start.map_or(0, |s| s.elapsed().as_millis() as u64);
                    info!(
                        "Extracted {} items with {} in {}ms",
                        items.len(),
                        strategy,
                        processing_time_ms
                    );
                    return Ok(ExtractionResult {
                        items,
                        strategy,
                        supplier_name: supplier,
                        attempts,
                        processing_time_ms,
                    });
                }
                Ok(_) => {
                    debug!("{} produced no items", strategy);
                    attempts.push(TierAttempt {
                        strategy,
                        items_found: 0,
                        failure: None,
                    });
                }
                Err(e) => {
                    warn!("{} failed, falling back: {}", strategy, e);
                    attempts.push(TierAttempt {
                        strategy,
                        items_found: 0,
                        failure: Some(e.to_string()),
                    });
                }
            }
            tier = strategy.fallback();
        }

        warn!("No items found after {} tiers", attempts.len());
        Err(ExtractionError::EmptyExtraction)
    }

    fn run_tier(
        &self,
        strategy: Strategy,
        document: &DocumentText,
        supplier: &str,
        credential: Option<&str>,
    ) -> std::result::Result<Vec<LineItem>, AiError> {
        match strategy {
            Strategy::Llm => {
                let (Some(extractor), Some(credential)) = (self.ai.as_ref(), credential) else {
                    return Ok(Vec::new());
                };
                debug!("Querying AI extractor {}", extractor.name());
                let reply = extractor.complete(&build_prompt(document.as_str()), credential.trim())?;
                parse_response(&reply)
            }
            Strategy::HeuristicStrict => Ok(self.heuristic.extract_strict(document, supplier)),
            Strategy::HeuristicLoose => Ok(self.heuristic.extract_loose(document, supplier)),
        }
    }
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemExtractor for ExtractionPipeline {
    fn extract(&self, document: &DocumentText, credential: Option<&str>) -> Result<ExtractionResult> {
        ExtractionPipeline::extract(self, document, credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const API_KEY: &str = "AIzaSyTestKey0123";

    const TABLE: &str = "\
Acme Supply Co.
Widget Blue 10 2.50 25.00
Gadget Red 2 4.75 9.50
";

    /// Replies with a fixed result and counts calls.
    struct ScriptedAi {
        reply: std::result::Result<String, AiError>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedAi {
        fn boxed(reply: std::result::Result<&str, AiError>) -> (Box<dyn AiExtractor>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let ai = ScriptedAi {
                reply: reply.map(str::to_string),
                calls: Arc::clone(&calls),
            };
            (Box::new(ai), calls)
        }
    }

    impl AiExtractor for ScriptedAi {
        fn name(&self) -> &str {
            "scripted"
        }

        fn complete(&self, prompt: &str, credential: &str) -> std::result::Result<String, AiError> {
            assert!(prompt.contains("Widget Blue") || prompt.contains("Servicio"));
            assert_eq!(credential, API_KEY);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn doc(text: &str) -> DocumentText {
        DocumentText::from_text(text).unwrap()
    }

    #[test]
    fn test_ai_tier_wins_when_it_returns_items() {
        let (ai, calls) = ScriptedAi::boxed(Ok(
            r#"{"items": [{"supplier_name": "Acme Supply Co.", "product_name": "Widget Blue",
                "quantity": 10, "unit_price": 2.5, "total_price": 25}]}"#,
        ));
        let pipeline = ExtractionPipeline::new().with_ai_extractor(ai);

        let result = pipeline.extract(&doc(TABLE), Some(API_KEY)).unwrap();
        assert_eq!(result.strategy, Strategy::Llm);
        assert_eq!(result.len(), 1);
        assert_eq!(result.supplier_name, "Acme Supply Co.");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ai_failures_fall_back_to_strict() {
        let failures = [
            Err(AiError::Timeout),
            Err(AiError::Status {
                code: 403,
                body: "forbidden".to_string(),
            }),
            Ok("Sorry, I cannot help with that."),
            Ok(r#"{"items": []}"#),
        ];

        for reply in failures {
            let (ai, calls) = ScriptedAi::boxed(reply);
            let pipeline = ExtractionPipeline::new().with_ai_extractor(ai);
            let result = pipeline.extract(&doc(TABLE), Some(API_KEY)).unwrap();

            assert_eq!(result.strategy, Strategy::HeuristicStrict);
            assert_eq!(result.len(), 2);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(result.attempts.len(), 2);
            assert_eq!(result.attempts[0].strategy, Strategy::Llm);
            assert!(result.attempts[0].failure.is_some());
        }
    }

    #[test]
    fn test_overflowing_ai_totals_fall_back_to_strict() {
        let (ai, calls) = ScriptedAi::boxed(Ok(
            r#"{"items": [{"supplier_name": "Acme Supply Co.", "product_name": "Widget Blue",
                "quantity": 1e15, "unit_price": 1e15, "total_price": null}]}"#,
        ));
        let pipeline = ExtractionPipeline::new().with_ai_extractor(ai);

        let result = pipeline.extract(&doc(TABLE), Some(API_KEY)).unwrap();
        assert_eq!(result.strategy, Strategy::HeuristicStrict);
        assert_eq!(result.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            result.attempts[0].failure.as_deref(),
            Some(AiError::EmptyItems.to_string().as_str())
        );
    }

    #[test]
    fn test_short_or_missing_credential_skips_ai() {
        for credential in [None, Some(""), Some("   short   "), Some("0123456789")] {
            let (ai, calls) = ScriptedAi::boxed(Ok("[]"));
            let pipeline = ExtractionPipeline::new().with_ai_extractor(ai);
            assert!(!pipeline.ai_usable(credential));

            let result = pipeline.extract(&doc(TABLE), credential).unwrap();
            assert_eq!(result.strategy, Strategy::HeuristicStrict);
            assert_eq!(calls.load(Ordering::SeqCst), 0);
            assert_eq!(result.attempts.len(), 1);
        }
    }

    #[test]
    fn test_disabled_ai_is_not_called() {
        let mut config = QuotexConfig::default();
        config.ai.enabled = false;
        let (ai, calls) = ScriptedAi::boxed(Ok("[]"));
        let pipeline = ExtractionPipeline::from_config(&config).with_ai_extractor(ai);

        let result = pipeline.extract(&doc(TABLE), Some(API_KEY)).unwrap();
        assert_eq!(result.strategy, Strategy::HeuristicStrict);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_strict_items_from_table() {
        let result = ExtractionPipeline::new().extract(&doc(TABLE), None).unwrap();
        assert_eq!(result.strategy, Strategy::HeuristicStrict);

        let widget = &result.items[0];
        assert_eq!(widget.supplier_name, "Acme Supply Co.");
        assert_eq!(widget.product_name, "Widget Blue");
        assert_eq!(widget.quantity, Some(Decimal::from(10)));
        assert_eq!(widget.total_price, Decimal::from(25));
        assert_eq!(result.grand_total(), Decimal::new(3450, 2));
    }

    #[test]
    fn test_loose_tier_after_empty_strict() {
        let text = "Distribuidora Central\nServicio de instalacion electrica 1500.00\n";
        let result = ExtractionPipeline::new().extract(&doc(text), None).unwrap();
        assert_eq!(result.strategy, Strategy::HeuristicLoose);
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.attempts,
            vec![
                TierAttempt {
                    strategy: Strategy::HeuristicStrict,
                    items_found: 0,
                    failure: None,
                },
                TierAttempt {
                    strategy: Strategy::HeuristicLoose,
                    items_found: 1,
                    failure: None,
                },
            ]
        );
    }

    #[test]
    fn test_empty_extraction_when_no_tier_finds_items() {
        let text = "Terms and conditions apply\nThank you for your business\n";
        assert_eq!(
            ExtractionPipeline::new().extract(&doc(text), None).unwrap_err(),
            ExtractionError::EmptyExtraction
        );
    }

    #[test]
    fn test_blank_pages_are_unextractable() {
        let pages = ["", "   ", "\n"];
        assert_eq!(
            ExtractionPipeline::new().extract_pages(&pages, None).unwrap_err(),
            ExtractionError::NoExtractableContent
        );
    }

    #[test]
    fn test_extract_pages_joins_text() {
        let pages = ["Acme Supply Co.", "Widget Blue 10 2.50 25.00"];
        let result = ExtractionPipeline::new().extract_pages(&pages, None).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.supplier_name, "Acme Supply Co.");
    }
}
