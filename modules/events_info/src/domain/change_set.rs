//! Field-level change sets recorded in an event's update history.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Event fields that can be changed by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventField {
    CreatedBy,
    Participants,
    Timezone,
    StartDate,
    StartTime,
    EndDate,
    EndTime,
}

impl EventField {
    pub const ALL: [EventField; 7] = [
        EventField::CreatedBy,
        EventField::Participants,
        EventField::Timezone,
        EventField::StartDate,
        EventField::StartTime,
        EventField::EndDate,
        EventField::EndTime,
    ];

    /// Stable key used on the wire and in storage.
    pub fn key(self) -> &'static str {
        match self {
            EventField::CreatedBy => "createdBy",
            EventField::Participants => "participants",
            EventField::Timezone => "timezone",
            EventField::StartDate => "startDate",
            EventField::StartTime => "startTime",
            EventField::EndDate => "endDate",
            EventField::EndTime => "endTime",
        }
    }

    /// Human-readable label shown in rendered history.
    pub fn label(self) -> &'static str {
        match self {
            EventField::CreatedBy => "Event Creator",
            EventField::Participants => "Participants",
            EventField::Timezone => "Timezone",
            EventField::StartDate => "Start Date",
            EventField::StartTime => "Start Time",
            EventField::EndDate => "End Date",
            EventField::EndTime => "End Time",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single old or new value of a changed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Identifier(Uuid),
    IdentifierSet(Vec<Uuid>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub old_value: FieldValue,
    pub new_value: FieldValue,
}

/// Sparse mapping of changed fields to their old/new values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    entries: BTreeMap<EventField, FieldChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: EventField, old_value: FieldValue, new_value: FieldValue) {
        self.entries.insert(
            field,
            FieldChange {
                old_value,
                new_value,
            },
        );
    }

    pub fn get(&self, field: EventField) -> Option<&FieldChange> {
        self.entries.get(&field)
    }

    pub fn contains(&self, field: EventField) -> bool {
        self.entries.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventField, &FieldChange)> + '_ {
        self.entries.iter().map(|(field, change)| (*field, change))
    }

    pub fn fields(&self) -> impl Iterator<Item = EventField> + '_ {
        self.entries.keys().copied()
    }

    /// Identifiers mentioned by either side of any change.
    pub fn referenced_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.entries
            .values()
            .flat_map(|c| [&c.old_value, &c.new_value])
            .flat_map(|v| match v {
                FieldValue::Identifier(id) => vec![*id],
                FieldValue::IdentifierSet(ids) => ids.clone(),
                FieldValue::Text(_) | FieldValue::Date(_) => Vec::new(),
            })
    }
}

/// One persisted, immutable entry of an event's update history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub updated_by: Uuid,
    pub updated_at: DateTime<Utc>,
    pub changes: ChangeSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_from_key() {
        for field in EventField::ALL {
            assert_eq!(EventField::from_key(field.key()), Some(field));
        }
        assert_eq!(EventField::from_key("location"), None);
    }

    #[test]
    fn referenced_ids_cover_both_sides() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut set = ChangeSet::new();
        set.insert(
            EventField::CreatedBy,
            FieldValue::Identifier(a),
            FieldValue::Identifier(b),
        );
        set.insert(
            EventField::Participants,
            FieldValue::IdentifierSet(vec![]),
            FieldValue::IdentifierSet(vec![c]),
        );
        set.insert(
            EventField::Timezone,
            FieldValue::Text("UTC".into()),
            FieldValue::Text("Asia/Tokyo".into()),
        );

        let ids: Vec<Uuid> = set.referenced_ids().collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&a) && ids.contains(&b) && ids.contains(&c));
    }
}
