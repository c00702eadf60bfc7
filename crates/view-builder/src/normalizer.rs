//! Record normalization
//!
//! Turns a raw [`SourceRecord`] into a [`NormalizedRecord`]: the identity field parsed into an
//! [`EntityId`], the entry, start and end dates parsed and checked against the build date, and
//! every other field left as text for the dataset mappers.

use crate::error::{BuildError, Result};
use crate::model::Dates;
use crate::source::SourceRecord;
use chrono::NaiveDate;
use view_common::EntityId;

/// Field carrying the upstream entity identifier
pub const IDENTITY_FIELD: &str = "entity";
pub const ENTRY_DATE_FIELD: &str = "entry-date";
pub const START_DATE_FIELD: &str = "start-date";
pub const END_DATE_FIELD: &str = "end-date";

/// Separator for multi-valued reference fields
pub const LIST_SEPARATOR: char = ';';

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated record, ready for a dataset mapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub entity: EntityId,
    pub dates: Dates,
    fields: SourceRecord,
}

impl NormalizedRecord {
    /// Trimmed value of a field, `None` when absent or blank
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Owned variant of [`field`](Self::field) for row construction
    pub fn text(&self, name: &str) -> Option<String> {
        self.field(name).map(str::to_string)
    }

    /// Entries of a `;`-separated list field
    ///
    /// Entries are trimmed, blanks are dropped and repeated entries keep only their first
    /// occurrence.
    pub fn list(&self, name: &str) -> Vec<&str> {
        let mut entries: Vec<&str> = Vec::new();
        if let Some(value) = self.field(name) {
            for entry in value.split(LIST_SEPARATOR).map(str::trim) {
                if !entry.is_empty() && !entries.contains(&entry) {
                    entries.push(entry);
                }
            }
        }
        entries
    }

    /// First field among `names` that has a value
    pub fn first_of<'a>(&'a self, names: &[&str]) -> Option<&'a str> {
        names.iter().find_map(|name| self.field(name))
    }
}

/// Validate a source record against the build date
pub fn normalize(record: SourceRecord, today: NaiveDate) -> Result<NormalizedRecord> {
    let entity = match non_blank(&record, IDENTITY_FIELD) {
        Some(raw) => raw.parse::<EntityId>().map_err(|_| {
            BuildError::validation(format!("invalid identity field: {raw:?}"))
        })?,
        None => return Err(BuildError::validation("missing identity field")),
    };

    let entry_date = match non_blank(&record, ENTRY_DATE_FIELD) {
        Some(raw) => parse_date(ENTRY_DATE_FIELD, raw)?,
        None => return Err(BuildError::validation("missing entry-date")),
    };
    if entry_date > today {
        return Err(BuildError::validation("entry-date in the future"));
    }

    let dates = Dates {
        entry_date: Some(entry_date),
        start_date: optional_date(&record, START_DATE_FIELD)?,
        end_date: optional_date(&record, END_DATE_FIELD)?,
    };

    Ok(NormalizedRecord {
        entity,
        dates,
        fields: record,
    })
}

/// Trimmed value of a field, `None` when absent or blank
pub(crate) fn non_blank<'a>(record: &'a SourceRecord, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub(crate) fn optional_date(record: &SourceRecord, field: &str) -> Result<Option<NaiveDate>> {
    non_blank(record, field)
        .map(|raw| parse_date(field, raw))
        .transpose()
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`)
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|source| BuildError::InvalidDate {
        field: field.to_string(),
        value: raw.to_string(),
        source,
    })
}
