//! Invoices command - browse the archive and bundle documents per invoice.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use archibon_core::{Archiver, PurchaseOrder};

use super::{print_grouping, ConfigSource, OutputFormat};

/// Arguments for the invoices command.
#[derive(Args)]
pub struct InvoicesArgs {
    #[command(subcommand)]
    command: InvoicesCommand,
}

#[derive(Subcommand)]
enum InvoicesCommand {
    /// List archived documents grouped by month, client, site and equipment
    List(ListArgs),

    /// Move archived documents into an invoice folder
    Bundle(BundleArgs),
}

#[derive(Args)]
struct ListArgs {
    /// Only this month code (e.g. oct25)
    #[arg(short, long)]
    month: Option<String>,

    /// Only this client
    #[arg(long)]
    client: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args)]
struct BundleArgs {
    /// Invoice name (folder name under the invoices directory)
    #[arg(required = true)]
    name: String,

    /// Archived documents to move
    files: Vec<PathBuf>,

    /// Purchase order to store with the bundle
    #[arg(long)]
    purchase_order: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: InvoicesArgs, source: &ConfigSource<'_>) -> anyhow::Result<()> {
    let config = source.load()?;
    let archiver = Archiver::from_config(&config);

    match args.command {
        InvoicesCommand::List(list) => list_documents(&archiver, list),
        InvoicesCommand::Bundle(bundle) => bundle_documents(&archiver, bundle),
    }
}

fn list_documents(archiver: &Archiver, args: ListArgs) -> anyhow::Result<()> {
    let view = archiver.invoice_view(args.month.as_deref(), args.client.as_deref())?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Text => {
            let months: Vec<&str> = view.month_codes.iter().map(|m| m.as_str()).collect();
            println!("Months:  {}", months.join(", "));
            println!("Clients: {}", view.clients.join(", "));
            println!();
            print_grouping(&view.grouping);
        }
    }

    Ok(())
}

fn bundle_documents(archiver: &Archiver, args: BundleArgs) -> anyhow::Result<()> {
    let purchase_order = match &args.purchase_order {
        Some(path) => {
            if !path.is_file() {
                anyhow::bail!("Purchase order not found: {}", path.display());
            }
            Some(PurchaseOrder {
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                data: fs::read(path)?,
            })
        }
        None => None,
    };

    let outcome = archiver.bundle(&args.name, &args.files, purchase_order.as_ref())?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => {
            println!(
                "{} {} documents moved to {}",
                style("✓").green(),
                outcome.moved.len(),
                outcome.folder.display()
            );
            if let Some(order) = &outcome.purchase_order {
                println!("   Purchase order saved as {}", order.display());
            }
            for path in &outcome.missing {
                println!("   {} no longer exists: {}", style("!").yellow(), path.display());
            }
            for path in &outcome.rejected {
                println!("   {} not an archived document: {}", style("✗").red(), path.display());
            }
        }
    }

    Ok(())
}
