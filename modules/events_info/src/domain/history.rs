//! History formatter: renders stored change records for display.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::contract::model::{HistoryChange, HistoryEntry};
use crate::domain::change_set::{ChangeRecord, EventField, FieldChange, FieldValue};

pub const CHANGE_TYPE_MODIFIED: &str = "Modified";
pub const UNKNOWN_USER: &str = "Unknown";
pub const EMPTY_PARTICIPANTS: &str = "None";
pub const BLANK_PLACEHOLDER: &str = "\u{2014}";
/// Old value written by earlier revisions when the previous state was unknown.
pub const LEGACY_NOT_AVAILABLE: &str = "N/A";

/// chrono formats used when rendering dates and record timestamps.
#[derive(Debug, Clone, Copy)]
pub struct HistoryFormat<'a> {
    pub date_format: &'a str,
    pub timestamp_format: &'a str,
}

/// Borrowing view over an event's history.
///
/// [`HistoryFormatter::entries`] is lazy and can be called any number of times;
/// each call walks the records again in insertion order.
pub struct HistoryFormatter<'a> {
    records: &'a [ChangeRecord],
    names: &'a HashMap<Uuid, String>,
    format: HistoryFormat<'a>,
}

impl<'a> HistoryFormatter<'a> {
    pub fn new(
        records: &'a [ChangeRecord],
        names: &'a HashMap<Uuid, String>,
        format: HistoryFormat<'a>,
    ) -> Self {
        Self {
            records,
            names,
            format,
        }
    }

    /// One entry per record that still has a visible change.
    pub fn entries(&self) -> impl Iterator<Item = HistoryEntry> + '_ {
        self.records
            .iter()
            .filter_map(move |record| self.format_record(record))
    }

    fn format_record(&self, record: &ChangeRecord) -> Option<HistoryEntry> {
        let changes: Vec<HistoryChange> = record
            .changes
            .iter()
            .filter_map(|(field, change)| self.format_change(field, change))
            .collect();
        if changes.is_empty() {
            return None;
        }

        Some(HistoryEntry {
            updated_by: self
                .names
                .get(&record.updated_by)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_USER.to_string()),
            updated_at: render_timestamp(record.updated_at, self.format.timestamp_format),
            changes,
        })
    }

    fn format_change(&self, field: EventField, change: &FieldChange) -> Option<HistoryChange> {
        let old_value = self.render(&change.old_value);
        let new_value = self.render(&change.new_value);
        if old_value == new_value || old_value == LEGACY_NOT_AVAILABLE {
            return None;
        }

        Some(HistoryChange {
            field: field.label().to_string(),
            old_value,
            new_value,
            change_type: CHANGE_TYPE_MODIFIED,
        })
    }

    fn render(&self, value: &FieldValue) -> String {
        let rendered = match value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Date(date) => render_date(*date, self.format.date_format),
            FieldValue::Identifier(id) => self.resolve(*id),
            FieldValue::IdentifierSet(ids) if ids.is_empty() => EMPTY_PARTICIPANTS.to_string(),
            FieldValue::IdentifierSet(ids) => ids
                .iter()
                .map(|id| self.resolve(*id))
                .collect::<Vec<_>>()
                .join(", "),
        };
        if rendered.trim().is_empty() {
            BLANK_PLACEHOLDER.to_string()
        } else {
            rendered
        }
    }

    /// Unknown ids render as themselves.
    fn resolve(&self, id: Uuid) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

fn render_date(date: NaiveDate, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        return date.to_string();
    }
    out
}

fn render_timestamp(ts: DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", ts.format(format)).is_err() {
        return ts.to_rfc3339();
    }
    out
}
