//! Batch processing command for multiple quotation files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use quotex_core::extraction::ItemExtractor;
use quotex_core::models::config::QuotexConfig;
use quotex_core::{DocumentText, ExtractionResult};

use super::process::{OutputFormat, format_result};
use super::{Context, build_pipeline, describe_failure, document_label, is_supported, read_pages, resolve_api_key};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// API key for AI-assisted extraction
    #[arg(long)]
    api_key: Option<String>,

    /// Do not store results in the database
    #[arg(long)]
    no_save: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    quotation_id: Option<i64>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, context: &Context) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = context.load_config()?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let pipeline = Arc::new(build_pipeline(&config));
    let config = Arc::new(config);
    let api_key = resolve_api_key(args.api_key.clone(), &config);

    let mut outcomes = stream::iter(files)
        .map(|path| {
            let pipeline = Arc::clone(&pipeline);
            let config = Arc::clone(&config);
            let api_key = api_key.clone();
            tokio::task::spawn_blocking(move || {
                let file_start = Instant::now();
                let outcome =
                    process_single_file(&path, pipeline.as_ref(), &config, api_key.as_deref());
                (path, outcome, file_start.elapsed().as_millis() as u64)
            })
        })
        .buffer_unordered(args.jobs.max(1));

    // The store is only touched from this task.
    let mut store = if args.no_save {
        None
    } else {
        Some(context.open_store(&config)?)
    };

    let mut results = Vec::new();
    while let Some(joined) = outcomes.next().await {
        let (path, outcome, processing_time_ms) = joined?;

        match outcome {
            Ok(result) => {
                let quotation_id = match store.as_mut() {
                    Some(store) => Some(store.save(&document_label(&path), &result)?),
                    None => None,
                };
                results.push(ProcessResult {
                    path,
                    result: Some(result),
                    quotation_id,
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        result: None,
                        quotation_id: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let successful: Vec<_> = results.iter().filter(|r| r.result.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for entry in &successful {
            if let Some(result) = &entry.result {
                let output_name = entry
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("quotation");

                let extension = match args.format {
                    OutputFormat::Json => "json",
                    OutputFormat::Csv => "csv",
                    OutputFormat::Text => "txt",
                };

                let output_path = output_dir.join(format!("{}.{}", output_name, extension));
                fs::write(&output_path, format_result(result, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for entry in &failed {
            println!(
                "  - {}: {}",
                entry.path.display(),
                entry.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    extractor: &dyn ItemExtractor,
    config: &QuotexConfig,
    api_key: Option<&str>,
) -> anyhow::Result<ExtractionResult> {
    let pages = read_pages(path, &config.pdf)?;
    DocumentText::from_pages(&pages)
        .and_then(|document| extractor.extract(&document, api_key))
        .map_err(|e| anyhow::anyhow!("{}", describe_failure(&e)))
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "quotation_id",
        "supplier",
        "strategy",
        "items",
        "total",
        "processing_time_ms",
        "error",
    ])?;

    for entry in results {
        let filename = document_label(&entry.path);

        if let Some(result) = &entry.result {
            wtr.write_record([
                filename,
                "success".to_string(),
                entry.quotation_id.map(|id| id.to_string()).unwrap_or_default(),
                result.supplier_name.clone(),
                result.strategy.to_string(),
                result.items.len().to_string(),
                result.grand_total().to_string(),
                entry.processing_time_ms.to_string(),
                String::new(),
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                entry.processing_time_ms.to_string(),
                entry.error.clone().unwrap_or_default(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
