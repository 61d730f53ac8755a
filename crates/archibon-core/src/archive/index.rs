//! Grouped views of the archive tree, rebuilt from a fresh walk every time.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use super::layout::ArchiveLayout;
use crate::calendar::MonthCode;
use crate::error::Result;
use crate::models::document::{DocumentRef, GroupKey};

/// Documents bucketed by (month code, client, site, equipment).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveGrouping {
    groups: BTreeMap<GroupKey, Vec<DocumentRef>>,
}

impl ArchiveGrouping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document to its group, keeping each group sorted by file name.
    pub fn insert(&mut self, key: GroupKey, document: DocumentRef) {
        let docs = self.groups.entry(key).or_default();
        let at = docs.partition_point(|d| d < &document);
        docs.insert(at, document);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &Vec<DocumentRef>)> {
        self.groups.iter()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&Vec<DocumentRef>> {
        self.groups.get(key)
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of documents across all groups.
    pub fn document_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Month codes present, chronologically.
    pub fn month_codes(&self) -> Vec<MonthCode> {
        self.groups
            .keys()
            .filter_map(|k| k.month.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Clients present, alphabetically.
    pub fn clients(&self) -> Vec<String> {
        self.groups
            .keys()
            .map(|k| k.client.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Groups matching the month code and client, when given.
    pub fn filter(&self, month: Option<&MonthCode>, client: Option<&str>) -> Self {
        let groups = self
            .groups
            .iter()
            .filter(|(key, _)| month.is_none_or(|m| key.month.as_ref() == Some(m)))
            .filter(|(key, _)| client.is_none_or(|c| key.client == c))
            .map(|(key, docs)| (key.clone(), docs.clone()))
            .collect();
        Self { groups }
    }
}

// JSON maps need string keys, so groups serialize as a list
#[derive(Serialize)]
struct GroupEntry<'a> {
    #[serde(flatten)]
    key: &'a GroupKey,
    documents: &'a [DocumentRef],
}

impl Serialize for ArchiveGrouping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.groups
                .iter()
                .map(|(key, documents)| GroupEntry { key, documents }),
        )
    }
}

impl FromIterator<(GroupKey, DocumentRef)> for ArchiveGrouping {
    fn from_iter<I: IntoIterator<Item = (GroupKey, DocumentRef)>>(iter: I) -> Self {
        let mut grouping = Self::new();
        for (key, doc) in iter {
            grouping.insert(key, doc);
        }
        grouping
    }
}

/// A document whose modification time fell in the requested month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedDocument {
    pub key: GroupKey,
    pub document: DocumentRef,
}

/// Walks the archive tree, skipping excluded subtrees.
#[derive(Debug, Clone)]
pub struct ArchiveIndex {
    root: PathBuf,
    excluded: Vec<PathBuf>,
}

impl ArchiveIndex {
    /// Index over `root` with nothing excluded.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: Vec::new(),
        }
    }

    /// Index over the layout root, excluding the invoices and staging subtrees.
    pub fn for_layout(layout: &ArchiveLayout) -> Self {
        layout
            .reserved_dirs()
            .into_iter()
            .fold(Self::new(layout.root()), |index, dir| index.exclude(dir))
    }

    /// Skip everything under `dir`.
    pub fn exclude(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded.push(dir.into());
        self
    }

    /// Group every classified file by its folder segments.
    pub fn scan(&self) -> Result<ArchiveGrouping> {
        let mut grouping = ArchiveGrouping::new();
        self.walk(|key, document| grouping.insert(key, document))?;
        debug!(
            "Scanned {} documents in {} groups",
            grouping.document_count(),
            grouping.len()
        );
        Ok(grouping)
    }

    /// PDF files last modified during the given local month.
    pub fn scan_by_date(&self, year: i32, month: u32) -> Result<Vec<DatedDocument>> {
        let mut found = Vec::new();
        self.walk(|key, document| {
            let in_month = document
                .modified
                .is_some_and(|m| m.year() == year && m.month() == month);
            if in_month && is_pdf(&document.path) {
                found.push(DatedDocument { key, document });
            }
        })?;
        found.sort_by(|a, b| (&a.key, &a.document).cmp(&(&b.key, &b.document)));
        Ok(found)
    }

    fn walk(&self, mut visit: impl FnMut(GroupKey, DocumentRef)) -> Result<()> {
        if !self.root.is_dir() {
            debug!("Archive root {} does not exist yet", self.root.display());
            return Ok(());
        }

        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if dir == self.root => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                        continue;
                    }
                };
                let path = entry.path();

                // entries may vanish while an invoice is being bundled
                let file_type = match entry.file_type() {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        continue;
                    }
                };

                if file_type.is_dir() {
                    if !self.is_excluded(&path) {
                        pending.push(path);
                    }
                } else if file_type.is_file() {
                    match self.classify(&path) {
                        Some(key) => {
                            let modified = entry
                                .metadata()
                                .and_then(|m| m.modified())
                                .map(DateTime::<Local>::from);
                            let modified = match modified {
                                Ok(m) => Some(m),
                                Err(e) => {
                                    warn!("Skipping {}: {}", path.display(), e);
                                    continue;
                                }
                            };
                            let file_name = entry.file_name().to_string_lossy().into_owned();
                            visit(
                                key,
                                DocumentRef {
                                    file_name,
                                    path,
                                    modified,
                                },
                            );
                        }
                        None => debug!("Ignoring unclassified file {}", path.display()),
                    }
                }
            }
        }
        Ok(())
    }

    fn is_excluded(&self, dir: &Path) -> bool {
        self.excluded.iter().any(|excluded| dir.starts_with(excluded))
    }

    // client/site/equipment/file, or month/client/site/equipment/file
    pub(crate) fn classify(&self, path: &Path) -> Option<GroupKey> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        match segments.as_slice() {
            // a month folder missing one level is not a client
            [first, ..] if segments.len() == 4 && MonthCode::from_folder(first.as_str()).is_valid() => {
                None
            }
            [client, site, equipment, _file] => Some(GroupKey {
                month: None,
                client: client.clone(),
                site: site.clone(),
                equipment: equipment.clone(),
            }),
            [month, client, site, equipment, _file] => Some(GroupKey {
                month: Some(MonthCode::from_folder(month.clone())),
                client: client.clone(),
                site: site.clone(),
                equipment: equipment.clone(),
            }),
            _ => None,
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
