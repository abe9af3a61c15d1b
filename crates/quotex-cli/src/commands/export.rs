//! Export command - write the most recent quotation as a table.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use super::Context;
use crate::export::{ExportFormat, render_stored};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: ExportFormat,

    /// Output file or directory (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export this quotation instead of the most recent one
    #[arg(short, long)]
    quotation: Option<i64>,
}

pub async fn run(args: ExportArgs, context: &Context) -> anyhow::Result<()> {
    let config = context.load_config()?;
    let store = context.open_store(&config)?;

    let quotation = match args.quotation {
        Some(id) => store.quotation(id)?,
        None => store.latest_quotation()?,
    };

    if let (None, Some(id)) = (&quotation, args.quotation) {
        anyhow::bail!("Quotation not found: {}", id);
    }

    // No quotation yet still yields a header-only table.
    let items = match &quotation {
        Some(record) => store.items_for(record.id)?,
        None => Vec::new(),
    };

    let rendered = render_stored(&items, args.format)?;

    match &args.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(default_file_name(args.format))
            } else {
                path.clone()
            };
            fs::write(&path, &rendered)?;
            let source = quotation
                .as_ref()
                .map(|record| format!(" of {}", record.filename))
                .unwrap_or_default();
            eprintln!(
                "{} Exported {} items{} to {}",
                style("✓").green(),
                items.len(),
                source,
                path.display()
            );
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// File name used when `--output` is a directory.
fn default_file_name(format: ExportFormat) -> String {
    format!("quotations_export.{}", format.extension())
}
