//! CLI subcommands.

pub mod analyze;
pub mod archive;
pub mod batch;
pub mod config;
pub mod fetch;
pub mod history;
pub mod invoices;
pub mod month;

use std::path::{Path, PathBuf};

use console::style;
use tracing::debug;

use archibon_core::models::config::ArchibonConfig;
use archibon_core::ArchiveGrouping;

/// Output format for listings.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// Where the configuration comes from: `--config`, else the default file,
/// else built-in defaults. `--root` overrides the archive root.
pub struct ConfigSource<'a> {
    path: Option<&'a str>,
    root: Option<&'a Path>,
}

impl<'a> ConfigSource<'a> {
    pub fn new(path: Option<&'a str>, root: Option<&'a Path>) -> Self {
        Self { path, root }
    }

    /// File `config` subcommands read and write.
    pub fn file(&self) -> PathBuf {
        self.path
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path)
    }

    pub fn load(&self) -> anyhow::Result<ArchibonConfig> {
        let mut config = match self.path {
            Some(path) => ArchibonConfig::from_file(Path::new(path))?,
            None => {
                let default_path = default_config_path();
                if default_path.exists() {
                    debug!("Using config file {}", default_path.display());
                    ArchibonConfig::from_file(&default_path)?
                } else {
                    ArchibonConfig::default()
                }
            }
        };

        if let Some(root) = self.root {
            config.archive.root = root.to_path_buf();
        }
        Ok(config)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("archibon")
        .join("config.json")
}

/// Print a grouping as an indented tree.
pub fn print_grouping(grouping: &ArchiveGrouping) {
    if grouping.is_empty() {
        println!("{} No documents found", style("ℹ").blue());
        return;
    }

    for (key, documents) in grouping.iter() {
        let heading = match &key.month {
            Some(month) => format!("{} / {} / {} / {}", month, key.client, key.site, key.equipment),
            None => format!("{} / {} / {}", key.client, key.site, key.equipment),
        };
        println!("{}", style(heading).bold());
        for doc in documents {
            let modified = doc
                .modified
                .map(|m| m.format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_default();
            println!("  {}  {}", style(modified).dim(), doc.path.display());
        }
    }
    println!();
    println!(
        "{} {} documents in {} groups",
        style("ℹ").blue(),
        grouping.document_count(),
        grouping.len()
    );
}
