//! History command - show the archival ledger.

use clap::Args;
use console::style;

use archibon_core::Archiver;

use super::{ConfigSource, OutputFormat};

/// Arguments for the history command.
#[derive(Args)]
pub struct HistoryArgs {
    /// Only the most recent N entries
    #[arg(short = 'n', long)]
    last: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: HistoryArgs, source: &ConfigSource<'_>) -> anyhow::Result<()> {
    let config = source.load()?;
    let archiver = Archiver::from_config(&config);

    let records = archiver.history()?;
    let skip = args
        .last
        .map(|n| records.len().saturating_sub(n))
        .unwrap_or(0);
    let records = &records[skip..];

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("{} Nothing archived yet", style("ℹ").blue());
                return Ok(());
            }
            for record in records {
                let month = record
                    .month_code
                    .as_ref()
                    .map(|m| m.as_str())
                    .unwrap_or("-");
                println!(
                    "{} {}  {:<7} {} / {} / {}  {}",
                    record.date,
                    record.time,
                    month,
                    record.client,
                    record.site,
                    record.equipment,
                    style(&record.file_name).dim()
                );
            }
        }
    }

    Ok(())
}
