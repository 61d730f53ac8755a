//! Batch archival of multiple delivery notes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use archibon_core::{ArchiveRequest, Archiver, ExtractedFields, UploadSource};

use super::ConfigSource;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern
    #[arg(required = true)]
    input: String,

    /// Reference date (YYYY-MM-DD) applied to every document
    #[arg(short, long)]
    date: Option<String>,

    /// Write a summary CSV to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Archived,
    /// Some field could not be extracted; needs an operator.
    Manual,
    Error,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Status::Archived => "archived",
            Status::Manual => "manual",
            Status::Error => "error",
        }
    }
}

/// Result of processing a single file.
struct BatchResult {
    path: PathBuf,
    status: Status,
    fields: ExtractedFields,
    archived: Option<PathBuf>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, source: &ConfigSource<'_>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = source.load()?;
    let archiver = Archiver::from_config(&config);

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            ext.eq_ignore_ascii_case("pdf")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to archive",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let result = archive_one(&archiver, &path, args.date.as_deref());
        match result {
            Ok(result) => results.push(result),
            Err(e) => {
                let message = e.to_string();
                if !args.continue_on_error {
                    pb.abandon();
                    error!("Failed to archive {}: {}", path.display(), message);
                    anyhow::bail!("Archiving failed: {}", message);
                }
                warn!("Failed to archive {}: {}", path.display(), message);
                results.push(BatchResult {
                    path,
                    status: Status::Error,
                    fields: ExtractedFields::default(),
                    archived: None,
                    error: Some(message),
                });
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let count = |status| results.iter().filter(|r| r.status == status).count();
    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} archived, {} need manual classification, {} failed",
        style(count(Status::Archived)).green(),
        style(count(Status::Manual)).yellow(),
        style(count(Status::Error)).red()
    );

    let pending: Vec<_> = results.iter().filter(|r| r.status != Status::Archived).collect();
    if !pending.is_empty() {
        println!();
        println!("{}", style("Not archived:").yellow());
        for result in pending {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn archive_one(
    archiver: &Archiver,
    path: &Path,
    date: Option<&str>,
) -> anyhow::Result<BatchResult> {
    let data = fs::read(path)?;
    let fields = archiver.extract_fields(&data);

    if let Some(missing) = fields.first_missing() {
        return Ok(BatchResult {
            path: path.to_path_buf(),
            status: Status::Manual,
            fields,
            archived: None,
            error: Some(format!("{} not found", missing)),
        });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let archived = archiver.archive(ArchiveRequest {
        fields: fields.clone(),
        reference_date: date.map(str::to_string),
        source: UploadSource::Bytes { file_name, data },
    })?;

    Ok(BatchResult {
        path: path.to_path_buf(),
        status: Status::Archived,
        fields,
        archived: Some(archived.path),
        error: None,
    })
}

fn write_summary(path: &Path, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "status", "client", "site", "equipment", "archived_path", "error"])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let archived = result
            .archived
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        wtr.write_record([
            filename,
            result.status.as_str(),
            &result.fields.client,
            &result.fields.site,
            &result.fields.equipment,
            &archived,
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
