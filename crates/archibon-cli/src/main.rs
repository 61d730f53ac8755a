//! CLI application for classifying and archiving delivery notes.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{analyze, archive, batch, config, fetch, history, invoices, month, ConfigSource};

/// Archibon - sort scanned delivery notes into a client/site/equipment archive
#[derive(Parser)]
#[command(name = "archibon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Archive root (overrides the configured one)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract client, site and equipment from a delivery note and stage it
    Analyze(analyze::AnalyzeArgs),

    /// Archive a delivery note under its client/site/equipment folder
    Archive(archive::ArchiveArgs),

    /// Archive every delivery note matching a pattern
    Batch(batch::BatchArgs),

    /// List archived documents or bundle them into an invoice folder
    Invoices(invoices::InvoicesArgs),

    /// List documents archived during a month
    Month(month::MonthArgs),

    /// Copy an archived PDF out of the archive
    Fetch(fetch::FetchArgs),

    /// Show the archival history
    History(history::HistoryArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let source = ConfigSource::new(cli.config.as_deref(), cli.root.as_deref());

    match cli.command {
        Commands::Analyze(args) => analyze::run(args, &source).await,
        Commands::Archive(args) => archive::run(args, &source).await,
        Commands::Batch(args) => batch::run(args, &source).await,
        Commands::Invoices(args) => invoices::run(args, &source).await,
        Commands::Month(args) => month::run(args, &source).await,
        Commands::Fetch(args) => fetch::run(args, &source).await,
        Commands::History(args) => history::run(args, &source).await,
        Commands::Config(args) => config::run(args, &source).await,
    }
}
