//! Analyze command - propose fields for a delivery note.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use archibon_core::Archiver;

use super::{ConfigSource, OutputFormat};

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Delivery note (PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: AnalyzeArgs, source: &ConfigSource<'_>) -> anyhow::Result<()> {
    let config = source.load()?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Analyzing file: {}", args.input.display());
    let data = fs::read(&args.input)?;
    let file_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let archiver = Archiver::from_config(&config);
    let analysis = archiver.analyze(&file_name, &data)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => {
            let show = |label: &str, value: &str| {
                if value.is_empty() {
                    println!("  {:<10} {}", label, style("(not found)").yellow());
                } else {
                    println!("  {:<10} {}", label, value);
                }
            };
            println!("{} {}", style("✓").green(), analysis.file_name);
            show("Client", &analysis.fields.client);
            show("Chantier", &analysis.fields.site);
            show("Matériel", &analysis.fields.equipment);
            println!();
            println!("Upload: {}", style(&analysis.upload).cyan());
            println!(
                "Confirm with: archibon archive --upload {} [--client ..] [--site ..] [--equipment ..]",
                analysis.upload
            );
        }
    }

    Ok(())
}
