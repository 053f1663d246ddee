//! Append-only flat-file record of delivered reminders.
//!
//! The log is the dedup source of truth: a (phone, day, shift) triple that
//! appears here is never sent again. Reads are tolerant — a missing file is
//! an empty log, and a store written by an older build with fewer columns
//! loads with the absent fields empty.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::table;

pub const LOG_COLUMNS: [&str; 7] = [
    "Day",
    "Shift",
    "Name",
    "Phone",
    "Work",
    "Message",
    "Timestamp",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub day: String,
    pub shift: String,
    pub name: String,
    pub phone: String,
    pub work: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryLogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct DeliveryLog {
    path: PathBuf,
}

impl DeliveryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every persisted record. A missing store is an empty log.
    pub fn load(&self) -> Result<Vec<DeliveryRecord>, DeliveryLogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        let mut records = table::parse_rows(&text).into_iter();
        let header = records.next().unwrap_or_default();

        let index_of = |column: &str| header.iter().position(|cell| cell == column);
        let day = index_of("Day");
        let shift = index_of("Shift");
        let name = index_of("Name");
        let phone = index_of("Phone");
        let work = index_of("Work");
        let message = index_of("Message");
        let timestamp = index_of("Timestamp");

        Ok(records
            .map(|record| DeliveryRecord {
                day: cell_at(&record, day),
                shift: cell_at(&record, shift),
                name: cell_at(&record, name),
                phone: cell_at(&record, phone),
                work: cell_at(&record, work),
                message: cell_at(&record, message),
                timestamp: cell_at(&record, timestamp),
            })
            .collect())
    }

    /// True when a record matches all three dedup fields exactly.
    pub fn contains(&self, phone: &str, day: &str, shift: &str) -> Result<bool, DeliveryLogError> {
        Ok(already_sent(&self.load()?, phone, day, shift))
    }

    /// Append one record, creating the store (with its header) on first use.
    pub fn append(&self, record: &DeliveryRecord) -> Result<(), DeliveryLogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let new_store = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if new_store {
            file.write_all(table::format_row(&LOG_COLUMNS).as_bytes())?;
        }
        file.write_all(
            table::format_row(&[
                record.day.as_str(),
                record.shift.as_str(),
                record.name.as_str(),
                record.phone.as_str(),
                record.work.as_str(),
                record.message.as_str(),
                record.timestamp.as_str(),
            ])
            .as_bytes(),
        )?;
        file.flush()?;
        Ok(())
    }
}

/// Membership check against an already-loaded snapshot of the log.
pub fn already_sent(records: &[DeliveryRecord], phone: &str, day: &str, shift: &str) -> bool {
    records
        .iter()
        .any(|record| record.phone == phone && record.day == day && record.shift == shift)
}

fn cell_at(record: &[String], index: Option<usize>) -> String {
    index
        .and_then(|index| record.get(index))
        .cloned()
        .unwrap_or_default()
}
