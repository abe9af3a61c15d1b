//! Inspect command - show how each line is classified and read.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use quotex_core::extraction::{Classification, FieldMapper, HeuristicParser};
use quotex_core::DocumentText;

use super::{Context, describe_failure, read_pages};

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Only show lines that yield a strict item
    #[arg(long)]
    items_only: bool,

    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct LineReport {
    line: usize,
    text: String,
    verdict: String,
    trailing: Vec<String>,
    product_id: Option<String>,
    product_name: Option<String>,
    fields: Option<String>,
}

pub async fn run(args: InspectArgs, context: &Context) -> anyhow::Result<()> {
    let config = context.load_config()?;
    let pages = read_pages(&args.input, &config.pdf)?;
    let document = DocumentText::from_pages(&pages)
        .map_err(|e| anyhow::anyhow!("{}", describe_failure(&e)))?;

    let parser = HeuristicParser::from_config(&config.extraction);
    let mapper = FieldMapper::from_config(&config.extraction);

    let reports: Vec<LineReport> = document
        .lines()
        .enumerate()
        .map(|(index, line)| {
            let analyzed = parser.analyze_line(line);
            let verdict = match analyzed.classification {
                Classification::Noise(reason) => format!("noise: {}", reason),
                Classification::Candidate => "candidate".to_string(),
            };
            let columns = analyzed.columns.unwrap_or_default();
            let fields = mapper.map(&columns.trailing).map(|f| {
                let tax = f.tax_amount.map(|t| format!(" tax={}", t)).unwrap_or_default();
                format!("qty={} price={}{} total={}", f.quantity, f.unit_price, tax, f.total_price)
            });
            let product_name = (!columns.descriptive.is_empty())
                .then(|| columns.product_name(config.extraction.max_name_tokens));

            LineReport {
                line: index + 1,
                text: analyzed.text,
                verdict,
                trailing: columns.trailing.iter().map(|d| d.to_string()).collect(),
                product_id: columns.product_id,
                product_name,
                fields,
            }
        })
        .filter(|report| !args.items_only || report.fields.is_some())
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!(
        "{} Supplier: {}",
        style("ℹ").blue(),
        parser.supplier(&document)
    );
    println!();

    for report in &reports {
        let verdict = if report.fields.is_some() {
            style(report.verdict.as_str()).green()
        } else if report.verdict == "candidate" {
            style(report.verdict.as_str()).yellow()
        } else {
            style(report.verdict.as_str()).dim()
        };
        println!("{:>4} | {} | {}", report.line, verdict, report.text);

        if let Some(fields) = &report.fields {
            let id = report.product_id.as_deref().unwrap_or("-");
            let name = report.product_name.as_deref().unwrap_or("");
            println!("     |   id={} name={:?} {}", id, name, fields);
        }
    }

    Ok(())
}
