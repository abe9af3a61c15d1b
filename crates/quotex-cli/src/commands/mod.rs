//! Subcommands and the setup they share.

pub mod batch;
pub mod config;
pub mod export;
pub mod inspect;
pub mod items;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::debug;

use quotex_core::extraction::ExtractionPipeline;
use quotex_core::models::config::{PdfConfig, QuotexConfig};
use quotex_core::pdf::PdfExtractor;
use quotex_core::ExtractionError;

use crate::gemini::GeminiClient;
use crate::store::QuotationStore;

/// Global options every command may need.
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub database: Option<PathBuf>,
}

impl Context {
    /// Explicit `--config`, else the default file if present, else defaults.
    pub fn load_config(&self) -> anyhow::Result<QuotexConfig> {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => {
                let default = config::default_config_path();
                if !default.exists() {
                    return Ok(QuotexConfig::default());
                }
                default
            }
        };
        debug!("Loading config from {}", path.display());
        Ok(QuotexConfig::from_file(&path)?)
    }

    pub fn database_path(&self, config: &QuotexConfig) -> PathBuf {
        self.database
            .clone()
            .or_else(|| config.storage.database_path.clone())
            .unwrap_or_else(default_database_path)
    }

    pub fn open_store(&self, config: &QuotexConfig) -> anyhow::Result<QuotationStore> {
        QuotationStore::open(&self.database_path(config))
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotex")
        .join("quotations.db")
}

/// Pipeline with the Gemini client attached when AI extraction is enabled.
pub fn build_pipeline(config: &QuotexConfig) -> ExtractionPipeline {
    let pipeline = ExtractionPipeline::from_config(config);
    if config.ai.enabled {
        pipeline.with_ai_extractor(Box::new(GeminiClient::from_config(&config.ai)))
    } else {
        pipeline
    }
}

/// `--api-key`, else the environment variable named in the config.
pub fn resolve_api_key(arg: Option<String>, config: &QuotexConfig) -> Option<String> {
    arg.or_else(|| std::env::var(&config.ai.api_key_env).ok())
        .filter(|key| !key.trim().is_empty())
}

/// Read a quotation as per-page text. PDFs go through the PDF extractor;
/// `.txt` files are a single page.
pub fn read_pages(path: &Path, config: &PdfConfig) -> anyhow::Result<Vec<String>> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let pages = PdfExtractor::pages_from_bytes(&data, config)
                .with_context(|| format!("Failed to read PDF {}", path.display()))?;
            debug!("Read {} pages from {}", pages.len(), path.display());
            Ok(pages)
        }
        "txt" | "text" => Ok(vec![fs::read_to_string(path)?]),
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

pub fn is_supported(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "pdf" | "txt" | "text")
}

/// Turn request-level extraction failures into user-facing messages.
pub fn describe_failure(error: &ExtractionError) -> &'static str {
    match error {
        ExtractionError::NoExtractableContent => {
            "No text found in document. This might be a scanned image (OCR required)."
        }
        ExtractionError::EmptyExtraction => "Could not extract any items.",
    }
}

/// Label stored with a quotation: the file name.
pub fn document_label(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
