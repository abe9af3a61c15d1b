//! Process command - extract line items from a single quotation.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use quotex_core::ExtractionResult;

use super::{Context, build_pipeline, describe_failure, document_label, read_pages, resolve_api_key};
use crate::export::{result_csv, result_text};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// API key for AI-assisted extraction
    #[arg(long)]
    api_key: Option<String>,

    /// Do not store the result in the database
    #[arg(long)]
    no_save: bool,

    /// Show which extraction tiers ran
    #[arg(long)]
    show_attempts: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, context: &Context) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = context.load_config()?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Reading document...");

    let pages = read_pages(&args.input, &config.pdf)?;
    debug!("Read {} pages", pages.len());

    pb.set_message("Extracting line items...");
    let pipeline = build_pipeline(&config);
    let api_key = resolve_api_key(args.api_key.clone(), &config);

    let outcome = tokio::task::spawn_blocking(move || {
        pipeline.extract_pages(&pages, api_key.as_deref())
    })
    .await?;

    pb.finish_and_clear();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => anyhow::bail!("{}", describe_failure(&e)),
    };

    if !args.no_save {
        let mut store = context.open_store(&config)?;
        let quotation_id = store.save(&document_label(&args.input), &result)?;
        eprintln!(
            "{} Saved {} items as quotation {}",
            style("✓").green(),
            result.items.len(),
            quotation_id
        );
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_attempts {
        for attempt in &result.attempts {
            eprintln!(
                "{} {}: {} items{}",
                style("ℹ").blue(),
                attempt.strategy,
                attempt.items_found,
                attempt
                    .failure
                    .as_deref()
                    .map(|f| format!(" ({})", f))
                    .unwrap_or_default()
            );
        }
        eprintln!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => result_csv(result),
        OutputFormat::Text => Ok(result_text(result)),
    }
}
