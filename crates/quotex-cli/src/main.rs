//! CLI application for price-quotation line-item extraction.

mod commands;
mod export;
mod gemini;
mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{batch, config, export as export_cmd, inspect, items, process};

/// Quotation extractor - turn supplier price quotations into line items
#[derive(Parser)]
#[command(name = "quotex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// SQLite database for extracted quotations
    #[arg(long, global = true, env = "QUOTEX_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract line items from a single quotation
    Process(process::ProcessArgs),

    /// Extract line items from many quotations
    Batch(batch::BatchArgs),

    /// Show how each line of a quotation is classified
    Inspect(inspect::InspectArgs),

    /// List or edit stored line items
    Items(items::ItemsArgs),

    /// Export the most recent quotation
    Export(export_cmd::ExportArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let context = commands::Context {
        config_path: cli.config.map(PathBuf::from),
        database: cli.database,
    };

    match cli.command {
        Commands::Process(args) => process::run(args, &context).await,
        Commands::Batch(args) => batch::run(args, &context).await,
        Commands::Inspect(args) => inspect::run(args, &context).await,
        Commands::Items(args) => items::run(args, &context).await,
        Commands::Export(args) => export_cmd::run(args, &context).await,
        Commands::Config(args) => config::run(args, &context).await,
    }
}
