//! Conversions between storage rows and domain/contract models.
//!
//! Change sets are stored as a JSON object keyed by field key:
//! `{"endTime": {"oldValue": "10:00", "newValue": "11:00"}}`. Identifiers are
//! strings, participant sets are arrays and dates use `YYYY-MM-DD`.

use std::collections::BTreeMap;

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::contract::model::{Event, User};
use crate::domain::change_set::{ChangeRecord, ChangeSet, EventField, FieldValue};
use crate::infra::storage::entity::{event, event_change, user};

const DATE_FORMAT: &str = "%Y-%m-%d";

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        User {
            id: m.id,
            name: m.name,
            created_at: m.created_at,
        }
    }
}

/// Combine the event row with its ordered participant ids.
pub fn event_from_model(m: event::Model, participants: Vec<Uuid>) -> Event {
    Event {
        id: m.id,
        created_by: m.created_by,
        participants,
        timezone: m.timezone,
        start_date: m.start_date,
        start_time: m.start_time,
        end_date: m.end_date,
        end_time: m.end_time,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredChange {
    #[serde(default)]
    old_value: Value,
    #[serde(default)]
    new_value: Value,
}

pub fn change_set_to_json(changes: &ChangeSet) -> Value {
    let stored: BTreeMap<&str, StoredChange> = changes
        .iter()
        .map(|(field, change)| {
            (
                field.key(),
                StoredChange {
                    old_value: value_to_json(&change.old_value),
                    new_value: value_to_json(&change.new_value),
                },
            )
        })
        .collect();
    serde_json::to_value(stored).unwrap_or(Value::Null)
}

pub fn change_set_from_json(json: Value) -> anyhow::Result<ChangeSet> {
    let stored: BTreeMap<String, StoredChange> =
        serde_json::from_value(json).context("malformed change set")?;

    let mut changes = ChangeSet::new();
    for (key, change) in stored {
        let Some(field) = EventField::from_key(&key) else {
            tracing::warn!(field = %key, "Skipping unknown field in stored change set");
            continue;
        };
        changes.insert(
            field,
            value_from_json(field, change.old_value),
            value_from_json(field, change.new_value),
        );
    }
    Ok(changes)
}

pub fn change_record_from_model(m: event_change::Model) -> anyhow::Result<ChangeRecord> {
    let changes = change_set_from_json(m.changes)
        .map_err(|e| anyhow!("change record {} of event {}: {}", m.id, m.event_id, e))?;
    Ok(ChangeRecord {
        updated_by: m.updated_by,
        updated_at: m.updated_at,
        changes,
    })
}

fn value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        FieldValue::Identifier(id) => Value::String(id.to_string()),
        FieldValue::IdentifierSet(ids) => {
            Value::Array(ids.iter().map(|id| Value::String(id.to_string())).collect())
        }
    }
}

/// Values that do not fit the field's kind are kept as text, so legacy rows
/// (for example an `"N/A"` old value) still load.
fn value_from_json(field: EventField, json: Value) -> FieldValue {
    match (field, json) {
        (EventField::CreatedBy, Value::String(s)) => match Uuid::parse_str(&s) {
            Ok(id) => FieldValue::Identifier(id),
            Err(_) => FieldValue::Text(s),
        },
        (EventField::Participants, Value::Array(items)) => {
            let ids: Option<Vec<Uuid>> = items
                .iter()
                .map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                .collect();
            match ids {
                Some(ids) => FieldValue::IdentifierSet(ids),
                None => FieldValue::Text(Value::Array(items).to_string()),
            }
        }
        (EventField::StartDate | EventField::EndDate, Value::String(s)) => {
            match NaiveDate::parse_from_str(&s, DATE_FORMAT) {
                Ok(d) => FieldValue::Date(d),
                Err(_) => FieldValue::Text(s),
            }
        }
        (_, Value::String(s)) => FieldValue::Text(s),
        (_, Value::Null) => FieldValue::Text(String::new()),
        (_, other) => FieldValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn change_set_survives_storage() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut changes = ChangeSet::new();
        changes.insert(
            EventField::CreatedBy,
            FieldValue::Identifier(a),
            FieldValue::Identifier(b),
        );
        changes.insert(
            EventField::Participants,
            FieldValue::IdentifierSet(vec![a]),
            FieldValue::IdentifierSet(vec![]),
        );
        changes.insert(
            EventField::StartDate,
            FieldValue::Date(day),
            FieldValue::Date(day.succ_opt().unwrap()),
        );

        let json = change_set_to_json(&changes);
        assert_eq!(json["startDate"]["oldValue"], "2024-05-01");
        assert_eq!(json["participants"]["newValue"], json!([]));

        assert_eq!(change_set_from_json(json).unwrap(), changes);
    }

    #[test]
    fn legacy_values_load_as_text() {
        let stored = json!({
            "startDate": {"oldValue": "N/A", "newValue": "2024-05-02"},
            "createdBy": {"oldValue": null, "newValue": "someone"},
            "location": {"oldValue": "A", "newValue": "B"}
        });

        let changes = change_set_from_json(stored).unwrap();

        assert_eq!(changes.len(), 2);
        let start = changes.get(EventField::StartDate).unwrap();
        assert_eq!(start.old_value, FieldValue::Text("N/A".into()));
        assert!(matches!(start.new_value, FieldValue::Date(_)));
        let creator = changes.get(EventField::CreatedBy).unwrap();
        assert_eq!(creator.old_value, FieldValue::Text(String::new()));
        assert_eq!(creator.new_value, FieldValue::Text("someone".into()));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(change_set_from_json(json!([1, 2])).is_err());
    }
}
