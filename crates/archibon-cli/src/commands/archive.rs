//! Archive command - file a delivery note into the archive tree.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::debug;

use archibon_core::{ArchiveRequest, Archiver, ExtractedFields, UploadHandle, UploadSource};

use super::{ConfigSource, OutputFormat};

/// Arguments for the archive command.
#[derive(Args)]
pub struct ArchiveArgs {
    /// Delivery note (PDF)
    #[arg(required_unless_present = "upload", conflicts_with = "upload")]
    input: Option<PathBuf>,

    /// Upload handle returned by `archibon analyze`
    #[arg(long)]
    upload: Option<String>,

    /// Client (extracted from the document when omitted)
    #[arg(long)]
    client: Option<String>,

    /// Jobsite (extracted from the document when omitted)
    #[arg(long)]
    site: Option<String>,

    /// Equipment (extracted from the document when omitted)
    #[arg(long)]
    equipment: Option<String>,

    /// Reference date (YYYY-MM-DD); files the document under its month folder
    #[arg(short, long)]
    date: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: ArchiveArgs, source: &ConfigSource<'_>) -> anyhow::Result<()> {
    let config = source.load()?;
    let archiver = Archiver::from_config(&config);

    let operator = ExtractedFields::new(
        args.client.unwrap_or_default(),
        args.site.unwrap_or_default(),
        args.equipment.unwrap_or_default(),
    );

    let (fields, upload) = match (args.input, args.upload) {
        (Some(input), _) => {
            if !input.exists() {
                anyhow::bail!("Input file not found: {}", input.display());
            }
            let data = fs::read(&input)?;
            let fields = if operator.is_complete() {
                operator
            } else {
                debug!("Completing fields from {}", input.display());
                operator.or(archiver.extract_fields(&data))
            };
            let file_name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (fields, UploadSource::Bytes { file_name, data })
        }
        (None, Some(handle)) => (operator, UploadSource::Staged(UploadHandle::new(handle))),
        (None, None) => anyhow::bail!("Either a file or --upload is required"),
    };

    let archived = archiver.archive(ArchiveRequest {
        fields,
        reference_date: args.date,
        source: upload,
    })?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&archived)?),
        OutputFormat::Text => println!(
            "{} Archived to {}",
            style("✓").green(),
            archived.path.display()
        ),
    }

    Ok(())
}
