//! Append-only archival history.
//!
//! A `;`-delimited UTF-8 file with a byte-order mark, so spreadsheet software
//! opens it with accents intact. The header is written once, when the file is
//! created or found empty.

use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::debug;

use crate::calendar::MonthCode;
use crate::error::Result;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Ledger column titles.
pub const HEADER: [&str; 7] = ["Date", "Heure", "Mois", "Client", "Chantier", "Machine", "Fichier"];

/// One archival event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRecord {
    /// `dd/mm/yyyy`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_code: Option<MonthCode>,
    pub client: String,
    pub site: String,
    pub equipment: String,
    pub file_name: String,
}

impl LedgerRecord {
    /// Record stamped with the given local time.
    pub fn at(
        when: DateTime<Local>,
        month_code: Option<MonthCode>,
        client: impl Into<String>,
        site: impl Into<String>,
        equipment: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            date: when.format("%d/%m/%Y").to_string(),
            time: when.format("%H:%M").to_string(),
            month_code,
            client: client.into(),
            site: site.into(),
            equipment: equipment.into(),
            file_name: file_name.into(),
        }
    }

    fn to_row(&self) -> [&str; 7] {
        [
            self.date.as_str(),
            self.time.as_str(),
            self.month_code.as_ref().map(MonthCode::as_str).unwrap_or(""),
            self.client.as_str(),
            self.site.as_str(),
            self.equipment.as_str(),
            self.file_name.as_str(),
        ]
    }

    fn from_row(row: &csv::StringRecord) -> Option<Self> {
        let field = |i: usize| row.get(i).unwrap_or("").to_string();
        match row.len() {
            7 => {
                let month = field(2);
                Some(Self {
                    date: field(0),
                    time: field(1),
                    month_code: (!month.is_empty()).then(|| MonthCode::from_folder(month)),
                    client: field(3),
                    site: field(4),
                    equipment: field(5),
                    file_name: field(6),
                })
            }
            // Rows written before the month column existed
            6 => Some(Self {
                date: field(0),
                time: field(1),
                month_code: None,
                client: field(2),
                site: field(3),
                equipment: field(4),
                file_name: field(5),
            }),
            _ => None,
        }
    }
}

/// Durable, ordered log of archival events.
#[derive(Debug, Clone)]
pub struct ArchivalLedger {
    path: PathBuf,
}

impl ArchivalLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append exactly one row, preceded by the header on a fresh ledger.
    pub fn append(&self, record: &LedgerRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let fresh = file.metadata()?.len() == 0;

        let mut buffer = Vec::new();
        if fresh {
            buffer.extend_from_slice(UTF8_BOM);
        }
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(b';')
                .from_writer(&mut buffer);
            if fresh {
                writer.write_record(HEADER)?;
            }
            writer.write_record(record.to_row())?;
            writer.flush()?;
        }

        // one write per call keeps rows whole
        file.write_all(&buffer)?;
        file.flush()?;

        debug!("Ledger row appended for {}", record.file_name);
        Ok(())
    }

    /// Every recorded row, oldest first. A missing ledger reads as empty.
    pub fn read_records(&self) -> Result<Vec<LedgerRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut raw = Vec::new();
        fs::File::open(&self.path)?.read_to_end(&mut raw)?;
        let content = raw.strip_prefix(UTF8_BOM).unwrap_or(&raw);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(content);

        let mut records = Vec::new();
        for row in reader.records() {
            if let Some(record) = LedgerRecord::from_row(&row?) {
                records.push(record);
            }
        }
        Ok(records)
    }
}
