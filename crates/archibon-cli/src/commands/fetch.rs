//! Fetch command - copy an archived PDF out of the archive.

use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use archibon_core::Archiver;

use super::ConfigSource;

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// Path of the archived PDF, absolute or relative to the archive root
    #[arg(required = true)]
    path: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: FetchArgs, source: &ConfigSource<'_>) -> anyhow::Result<()> {
    let config = source.load()?;
    let archiver = Archiver::from_config(&config);

    let mut document = archiver.open_pdf(&args.path)?;
    info!(
        "Serving {} ({} bytes, {})",
        document.path.display(),
        document.len,
        document.content_type
    );

    match &args.output {
        Some(output) => {
            let mut out = File::create(output)?;
            io::copy(&mut document.file, &mut out)?;
            eprintln!(
                "{} Wrote {} to {}",
                style("✓").green(),
                document.path.display(),
                output.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            io::copy(&mut document.file, &mut out)?;
        }
    }

    Ok(())
}
