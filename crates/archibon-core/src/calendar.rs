//! Month codes: French four-letter month abbreviation followed by a two-digit
//! year (`oct25`), used as the optional top-level archive folder.

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Canonical abbreviations, indexed by month - 1. Folder names are produced
/// from this table only.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "janv", "févr", "mars", "avr", "mai", "juin", "juil", "août", "sept", "oct", "nov", "déc",
];

/// Accent-less spellings from older trees. Recognised when reading, never
/// written. Matching is case-insensitive, so uppercase folders resolve too.
const LEGACY_ABBREVIATIONS: [(&str, u32); 3] = [("fevr", 2), ("aout", 8), ("dec", 12)];

/// Month number given to codes whose abbreviation is not recognised.
pub const UNKNOWN_MONTH: u32 = 13;

/// Years a month code can represent without ambiguity.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2099;

/// A month-code folder name.
///
/// Built from a (year, month) pair or taken verbatim from a folder name. Codes
/// that do not parse are kept as-is and order after every valid code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthCode(String);

impl MonthCode {
    /// Encode a month. `None` outside years 2000-2099 or months 1-12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !YEAR_RANGE.contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        let abbr = MONTH_ABBREVIATIONS[(month - 1) as usize];
        Some(Self(format!("{}{:02}", abbr, year % 100)))
    }

    /// Month code of the month containing `date`.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    /// Wrap an existing folder name without validating it.
    pub fn from_folder(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back to (year, month).
    pub fn parse(&self) -> Option<(i32, u32)> {
        let (abbr, year) = split_code(&self.0)?;
        let month = month_number(abbr)?;
        Some((year, month))
    }

    /// Chronological key. Unrecognised abbreviations map to [`UNKNOWN_MONTH`];
    /// an unreadable year maps to `i32::MAX`.
    pub fn sort_key(&self) -> (i32, u32) {
        match split_code(&self.0) {
            Some((abbr, year)) => (year, month_number(abbr).unwrap_or(UNKNOWN_MONTH)),
            None => (i32::MAX, UNKNOWN_MONTH),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.parse().is_some()
    }
}

fn split_code(code: &str) -> Option<(&str, i32)> {
    let digits = code.char_indices().rev().nth(1)?.0;
    let (abbr, year) = code.split_at(digits);
    if abbr.is_empty() || year.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    Some((abbr, 2000 + year))
}

fn month_number(abbr: &str) -> Option<u32> {
    let abbr = abbr.to_lowercase();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == abbr)
        .map(|i| i as u32 + 1)
        .or_else(|| {
            LEGACY_ABBREVIATIONS
                .iter()
                .find(|(legacy, _)| *legacy == abbr)
                .map(|(_, month)| *month)
        })
}

impl Ord for MonthCode {
    fn cmp(&self, other: &Self) -> Ordering {
        // valid codes first, chronologically; then the rest by key and name
        (!self.is_valid(), self.sort_key(), &self.0).cmp(&(
            !other.is_valid(),
            other.sort_key(),
            &other.0,
        ))
    }
}

impl PartialOrd for MonthCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MonthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
