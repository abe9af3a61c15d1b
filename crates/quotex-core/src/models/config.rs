//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{QuotexError, Result};
use crate::models::quotation::UNKNOWN_SUPPLIER;

/// Main configuration for quotex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotexConfig {
    /// Heuristic extraction thresholds.
    pub extraction: ExtractionConfig,

    /// AI-assisted extraction settings.
    pub ai: AiConfig,

    /// PDF text extraction settings.
    pub pdf: PdfConfig,

    /// Persistence settings.
    pub storage: StorageConfig,
}

/// Heuristic parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Lines shorter than this (in characters) are noise.
    pub min_line_length: usize,

    /// Header keywords only mark a line as noise below this length.
    pub header_max_length: usize,

    /// Minimum whitespace tokens for a strict candidate line.
    pub min_tokens: usize,

    /// Number of leading lines scanned for the supplier name.
    pub supplier_scan_lines: usize,

    /// Supplier name used when the scan finds nothing.
    pub unknown_supplier: String,

    /// Numbers must be strictly below this to count as column values.
    pub max_amount: u64,

    /// Quantities above this are treated as a misread column.
    pub max_quantity: u64,

    /// Maximum descriptive tokens joined into a product name.
    pub max_name_tokens: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_line_length: 10,
            header_max_length: 60,
            min_tokens: 3,
            supplier_scan_lines: 15,
            unknown_supplier: UNKNOWN_SUPPLIER.to_string(),
            max_amount: 1_000_000,
            max_quantity: 10_000,
            max_name_tokens: 20,
        }
    }
}

/// AI extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Try the AI tier when a credential is available.
    pub enabled: bool,

    /// Base URL of the generative language API.
    pub endpoint: String,

    /// Model identifier.
    pub model: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Credentials shorter than this are ignored.
    pub min_credential_length: usize,

    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 60,
            min_credential_length: 11,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { max_pages: 0 }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file; the platform data directory is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl QuotexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| QuotexError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| QuotexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
