//! Items command - list and edit stored line items.

use clap::{Args, Subcommand};
use console::style;
use rust_decimal::Decimal;

use quotex_core::parse_amount;

use super::Context;
use crate::store::{ItemUpdate, StoredItem};

/// Arguments for the items command.
#[derive(Args)]
pub struct ItemsArgs {
    #[command(subcommand)]
    command: ItemsCommand,
}

#[derive(Subcommand)]
enum ItemsCommand {
    /// List stored items
    List {
        /// Only items of this quotation
        #[arg(short, long)]
        quotation: Option<i64>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Edit a stored item
    Update(UpdateArgs),
}

#[derive(Args)]
struct UpdateArgs {
    /// Item ID
    id: i64,

    /// New product name
    #[arg(long)]
    product_name: Option<String>,

    /// New quantity
    #[arg(long, value_parser = parse_decimal)]
    quantity: Option<Decimal>,

    /// New unit price
    #[arg(long, value_parser = parse_decimal)]
    unit_price: Option<Decimal>,

    /// New total price
    #[arg(long, value_parser = parse_decimal)]
    total_price: Option<Decimal>,
}

fn parse_decimal(value: &str) -> Result<Decimal, String> {
    parse_amount(value).ok_or_else(|| format!("not a number: {}", value))
}

pub async fn run(args: ItemsArgs, context: &Context) -> anyhow::Result<()> {
    let config = context.load_config()?;
    let store = context.open_store(&config)?;

    match args.command {
        ItemsCommand::List { quotation, json } => {
            let items = match quotation {
                Some(id) => store.items_for(id)?,
                None => store.all_items()?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print_table(&items);
            }
        }
        ItemsCommand::Update(update_args) => {
            let update = ItemUpdate {
                product_name: update_args.product_name,
                quantity: update_args.quantity,
                unit_price: update_args.unit_price,
                total_price: update_args.total_price,
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update. Pass at least one field to change.");
            }
            if !store.update_item(update_args.id, &update)? {
                anyhow::bail!("Item not found: {}", update_args.id);
            }
            println!("{} Updated item {}", style("✓").green(), update_args.id);
            if let Some(item) = store.item(update_args.id)? {
                print_table(&[item]);
            }
        }
    }

    Ok(())
}

fn print_table(items: &[StoredItem]) {
    if items.is_empty() {
        println!("{} No items stored.", style("ℹ").blue());
        return;
    }

    println!(
        "{:>5} {:>5}  {:<24} {:<32} {:<12} {:>10} {:>12} {:>12}",
        "ID", "Quot", "Supplier", "Product", "Product ID", "Qty", "Unit", "Total"
    );
    for item in items {
        println!(
            "{:>5} {:>5}  {:<24} {:<32} {:<12} {:>10} {:>12} {:>12}",
            item.id,
            item.quotation_id,
            clip(&item.supplier_name, 24),
            clip(&item.product_name, 32),
            clip(item.product_id.as_deref().unwrap_or("-"), 12),
            item.quantity,
            item.unit_price,
            item.total_price
        );
    }
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}
