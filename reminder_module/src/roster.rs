//! Roster parsing with forgiving header matching.
//!
//! Source rosters come from people maintaining a spreadsheet by hand, so
//! column names are matched case-insensitively by substring ("Contact No."
//! resolves to Phone, "Person" to Name). Best-effort, not schema
//! validation: a header like "number of chores" will happily map to Phone.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::table;

pub const COL_DAY: &str = "Day";
pub const COL_SHIFT: &str = "Shift";
pub const COL_PHONE: &str = "Phone";
pub const COL_NAME: &str = "Name";
pub const COL_WORK: &str = "Work";

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("roster must contain a column for day (day, Day, etc.)")]
    MissingDayColumn,
}

/// One roster entry. `shift` is `None` when the roster has no Shift column.
#[derive(Debug, Clone)]
pub struct RosterRow {
    pub day: String,
    pub shift: Option<String>,
    pub name: String,
    pub phone: String,
    pub work: String,
}

#[derive(Debug, Clone)]
pub struct Roster {
    rows: Vec<RosterRow>,
    columns: Vec<&'static str>,
}

impl Roster {
    pub fn from_path(path: &Path) -> Result<Self, RosterError> {
        let text = fs::read_to_string(path)?;
        Self::from_text(&text)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, RosterError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_text(&text)
    }

    pub fn from_text(text: &str) -> Result<Self, RosterError> {
        let mut records = table::parse_rows(text).into_iter();
        let header = records.next().unwrap_or_default();

        // map each header cell to a canonical column; first match wins
        let mut columns: Vec<&'static str> = Vec::new();
        let mut indexes: Vec<Option<usize>> = vec![None; 5];
        for (position, cell) in header.iter().enumerate() {
            if let Some(canonical) = canonical_column(cell) {
                let slot = canonical_slot(canonical);
                if indexes[slot].is_none() {
                    indexes[slot] = Some(position);
                    columns.push(canonical);
                }
            }
        }

        let day_index = indexes[canonical_slot(COL_DAY)].ok_or(RosterError::MissingDayColumn)?;
        let shift_index = indexes[canonical_slot(COL_SHIFT)];
        let phone_index = indexes[canonical_slot(COL_PHONE)];
        let name_index = indexes[canonical_slot(COL_NAME)];
        let work_index = indexes[canonical_slot(COL_WORK)];

        let rows = records
            .map(|record| RosterRow {
                day: cell_at(&record, Some(day_index)),
                shift: shift_index.map(|index| cell_at(&record, Some(index))),
                phone: cell_at(&record, phone_index),
                name: cell_at(&record, name_index),
                work: cell_at(&record, work_index),
            })
            .collect();

        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    /// Canonical names of the columns that were resolved, in header order.
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn has_column(&self, canonical: &str) -> bool {
        self.columns.iter().any(|column| *column == canonical)
    }

    pub fn has_shift_column(&self) -> bool {
        self.has_column(COL_SHIFT)
    }
}

fn cell_at(record: &[String], index: Option<usize>) -> String {
    index
        .and_then(|index| record.get(index))
        .cloned()
        .unwrap_or_default()
}

/// Resolve a raw header cell to its canonical column name, mirroring the
/// substring heuristic the rosters were written against. Order matters:
/// "day" is checked first, so a "birthday" column would resolve to Day.
fn canonical_column(header: &str) -> Option<&'static str> {
    let header = header.trim().to_lowercase();
    if header.contains("day") {
        Some(COL_DAY)
    } else if header.contains("shift") {
        Some(COL_SHIFT)
    } else if header.contains("phone") || header.contains("number") || header.contains("contact") {
        Some(COL_PHONE)
    } else if header.contains("name") || header.contains("person") {
        Some(COL_NAME)
    } else if header.contains("work") || header.contains("task") || header.contains("chore") {
        Some(COL_WORK)
    } else {
        None
    }
}

fn canonical_slot(canonical: &str) -> usize {
    match canonical {
        COL_DAY => 0,
        COL_SHIFT => 1,
        COL_PHONE => 2,
        COL_NAME => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_alternate_header_names() {
        let roster =
            Roster::from_text("Day,Number,Person,Task\nMonday,9876543210,Asha,Dishes\n").unwrap();
        assert_eq!(
            roster.columns(),
            &[COL_DAY, COL_PHONE, COL_NAME, COL_WORK]
        );
        let row = &roster.rows()[0];
        assert_eq!(row.day, "Monday");
        assert_eq!(row.phone, "9876543210");
        assert_eq!(row.name, "Asha");
        assert_eq!(row.work, "Dishes");
        assert!(row.shift.is_none());
    }

    #[test]
    fn header_matching_ignores_case_and_padding() {
        let roster = Roster::from_text(
            " DAY , Contact No. , full name , Chore\nTuesday,123,Ravi,Trash\n",
        )
        .unwrap();
        assert!(roster.has_column(COL_PHONE));
        assert!(roster.has_column(COL_NAME));
        assert!(roster.has_column(COL_WORK));
        assert_eq!(roster.rows()[0].work, "Trash");
    }

    #[test]
    fn missing_day_column_is_fatal() {
        let err = Roster::from_text("Name,Phone,Work\nAsha,123,Dishes\n").unwrap_err();
        assert!(matches!(err, RosterError::MissingDayColumn));
    }

    #[test]
    fn empty_input_is_missing_day_column() {
        let err = Roster::from_text("").unwrap_err();
        assert!(matches!(err, RosterError::MissingDayColumn));
    }

    #[test]
    fn missing_cells_become_empty_strings() {
        let roster = Roster::from_text("Day,Shift,Name,Phone,Work\nMonday,Lunch\n").unwrap();
        let row = &roster.rows()[0];
        assert_eq!(row.shift.as_deref(), Some("Lunch"));
        assert_eq!(row.name, "");
        assert_eq!(row.phone, "");
        assert_eq!(row.work, "");
    }

    #[test]
    fn shift_column_is_optional() {
        let roster = Roster::from_text("Day,Name,Phone,Work\nMonday,Asha,123,Dishes\n").unwrap();
        assert!(!roster.has_shift_column());
        assert!(roster.rows()[0].shift.is_none());
    }

    #[test]
    fn first_header_match_wins_for_a_canonical_column() {
        let roster = Roster::from_text(
            "Day,Phone,Contact\nMonday,111,222\n",
        )
        .unwrap();
        // both headers resolve to Phone; the first column supplies the value
        assert_eq!(roster.rows()[0].phone, "111");
        assert_eq!(roster.columns(), &[COL_DAY, COL_PHONE]);
    }

    #[test]
    fn reads_from_any_reader() {
        let cursor = std::io::Cursor::new("Day,Name,Phone,Work\nMonday,Asha,123,Dishes\n");
        let roster = Roster::from_reader(cursor).unwrap();
        assert_eq!(roster.rows().len(), 1);
    }

    #[test]
    fn quoted_cells_keep_their_commas() {
        let roster = Roster::from_text(
            "Day,Name,Phone,Work\nMonday,Asha,123,\"Sweep, then mop\"\n",
        )
        .unwrap();
        assert_eq!(roster.rows()[0].work, "Sweep, then mop");
    }
}
