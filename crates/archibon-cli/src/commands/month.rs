//! Month command - documents archived during a given month.

use chrono::Local;
use clap::Args;
use console::style;

use archibon_core::Archiver;

use super::{print_grouping, ConfigSource, OutputFormat};

/// Arguments for the month command.
#[derive(Args)]
pub struct MonthArgs {
    /// Month to list, as YYYY-MM or YYYY-MM-DD (default: current month)
    date: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: MonthArgs, source: &ConfigSource<'_>) -> anyhow::Result<()> {
    let config = source.load()?;
    let archiver = Archiver::from_config(&config);

    let selection = args
        .date
        .unwrap_or_else(|| Local::now().format("%Y-%m").to_string());
    let listing = archiver.month_listing(&selection)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
        OutputFormat::Text => {
            let title = listing
                .month_code
                .as_ref()
                .map(|code| code.to_string())
                .unwrap_or_else(|| format!("{:04}-{:02}", listing.year, listing.month));
            println!("{} {}", style("Month").bold(), style(title).cyan());
            println!();
            print_grouping(&listing.grouping);
        }
    }

    Ok(())
}
