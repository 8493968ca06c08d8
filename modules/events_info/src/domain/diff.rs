//! Diff computer: compares a submitted patch against the stored event.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::contract::model::{Event, EventPatch};
use crate::domain::change_set::{ChangeSet, EventField, FieldValue};
use crate::domain::error::DomainError;

/// Compute the sparse change set between `stored` and `patch`.
///
/// Scalars count only when submitted, non-blank and different from the stored value.
/// Participants are compared as sets, so order and duplicates never produce a change.
pub fn compute_changes(stored: &Event, patch: &EventPatch) -> ChangeSet {
    let mut changes = ChangeSet::new();

    if let Some(created_by) = patch.created_by {
        if created_by != stored.created_by {
            changes.insert(
                EventField::CreatedBy,
                FieldValue::Identifier(stored.created_by),
                FieldValue::Identifier(created_by),
            );
        }
    }

    if let Some(participants) = &patch.participants {
        if as_set(participants) != as_set(&stored.participants) {
            changes.insert(
                EventField::Participants,
                FieldValue::IdentifierSet(stored.participants.clone()),
                FieldValue::IdentifierSet(dedup_participants(participants.clone())),
            );
        }
    }

    diff_text(
        &mut changes,
        EventField::Timezone,
        &stored.timezone,
        patch.timezone.as_deref(),
    );
    diff_text(
        &mut changes,
        EventField::StartTime,
        &stored.start_time,
        patch.start_time.as_deref(),
    );
    diff_text(
        &mut changes,
        EventField::EndTime,
        &stored.end_time,
        patch.end_time.as_deref(),
    );

    if let Some(start_date) = patch.start_date {
        if start_date != stored.start_date {
            changes.insert(
                EventField::StartDate,
                FieldValue::Date(stored.start_date),
                FieldValue::Date(start_date),
            );
        }
    }
    if let Some(end_date) = patch.end_date {
        if end_date != stored.end_date {
            changes.insert(
                EventField::EndDate,
                FieldValue::Date(stored.end_date),
                FieldValue::Date(end_date),
            );
        }
    }

    changes
}

/// Like [`compute_changes`], but an empty result is a rejected request.
pub fn require_changes(stored: &Event, patch: &EventPatch) -> Result<ChangeSet, DomainError> {
    let changes = compute_changes(stored, patch);
    if changes.is_empty() {
        return Err(DomainError::no_changes(stored.id));
    }
    Ok(changes)
}

/// Write the new side of every change into `event`.
pub fn apply_changes(event: &mut Event, changes: &ChangeSet) {
    for (field, change) in changes.iter() {
        match (field, &change.new_value) {
            (EventField::CreatedBy, FieldValue::Identifier(id)) => event.created_by = *id,
            (EventField::Participants, FieldValue::IdentifierSet(ids)) => {
                event.participants = ids.clone()
            }
            (EventField::Timezone, FieldValue::Text(v)) => event.timezone = v.clone(),
            (EventField::StartTime, FieldValue::Text(v)) => event.start_time = v.clone(),
            (EventField::EndTime, FieldValue::Text(v)) => event.end_time = v.clone(),
            (EventField::StartDate, FieldValue::Date(d)) => event.start_date = *d,
            (EventField::EndDate, FieldValue::Date(d)) => event.end_date = *d,
            (field, value) => {
                tracing::warn!(%field, ?value, "Ignoring change with mismatched value kind");
            }
        }
    }
}

/// Drop repeated participant ids, keeping the first occurrence order.
pub fn dedup_participants(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = BTreeSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn as_set(ids: &[Uuid]) -> BTreeSet<Uuid> {
    ids.iter().copied().collect()
}

fn diff_text(changes: &mut ChangeSet, field: EventField, stored: &str, submitted: Option<&str>) {
    let Some(submitted) = submitted.filter(|s| !s.trim().is_empty()) else {
        return;
    };
    if submitted != stored {
        changes.insert(
            field,
            FieldValue::Text(stored.to_string()),
            FieldValue::Text(submitted.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn stored(creator: Uuid, participants: Vec<Uuid>) -> Event {
        Event {
            id: Uuid::new_v4(),
            created_by: creator,
            participants,
            timezone: "America/New_York".into(),
            start_date: date(1),
            start_time: "09:00".into(),
            end_date: date(1),
            end_time: "10:00".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn end_time_only_change_is_recorded() {
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let ev = stored(u1, vec![u2]);
        let patch = EventPatch {
            start_time: Some("09:00".into()),
            end_time: Some("11:00".into()),
            ..Default::default()
        };

        let changes = compute_changes(&ev, &patch);

        assert_eq!(changes.len(), 1);
        let change = changes.get(EventField::EndTime).unwrap();
        assert_eq!(change.old_value, FieldValue::Text("10:00".into()));
        assert_eq!(change.new_value, FieldValue::Text("11:00".into()));
    }

    #[test]
    fn identical_payload_yields_no_changes() {
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let ev = stored(u1, vec![u2]);
        let patch = EventPatch {
            created_by: Some(u1),
            participants: Some(vec![u2]),
            timezone: Some(ev.timezone.clone()),
            start_date: Some(ev.start_date),
            start_time: Some(ev.start_time.clone()),
            end_date: Some(ev.end_date),
            end_time: Some(ev.end_time.clone()),
        };

        assert!(compute_changes(&ev, &patch).is_empty());
        match require_changes(&ev, &patch) {
            Err(DomainError::NoChanges { event_id }) => assert_eq!(event_id, ev.id),
            other => panic!("expected NoChanges, got {:?}", other),
        }
    }

    #[test]
    fn participants_compare_as_sets() {
        let (u1, u2, u3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let ev = stored(u1, vec![u2, u3]);

        let reordered = EventPatch {
            participants: Some(vec![u3, u2, u3]),
            ..Default::default()
        };
        assert!(compute_changes(&ev, &reordered).is_empty());

        let shrunk = EventPatch {
            participants: Some(vec![u3]),
            ..Default::default()
        };
        let changes = compute_changes(&ev, &shrunk);
        let change = changes.get(EventField::Participants).unwrap();
        assert_eq!(change.old_value, FieldValue::IdentifierSet(vec![u2, u3]));
        assert_eq!(change.new_value, FieldValue::IdentifierSet(vec![u3]));
    }

    #[test]
    fn clearing_participants_is_a_change() {
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
        let ev = stored(u1, vec![u2]);
        let patch = EventPatch {
            participants: Some(vec![]),
            ..Default::default()
        };
        assert!(compute_changes(&ev, &patch).contains(EventField::Participants));
    }

    #[test]
    fn blank_scalars_are_not_submissions() {
        let ev = stored(Uuid::new_v4(), vec![]);
        let patch = EventPatch {
            timezone: Some("".into()),
            start_time: Some("   ".into()),
            ..Default::default()
        };
        assert!(compute_changes(&ev, &patch).is_empty());
    }

    #[test]
    fn dates_compare_by_calendar_value() {
        let ev = stored(Uuid::new_v4(), vec![]);
        let patch = EventPatch {
            start_date: Some(date(1)),
            end_date: Some(date(2)),
            ..Default::default()
        };
        let changes = compute_changes(&ev, &patch);
        assert_eq!(changes.fields().collect::<Vec<_>>(), vec![EventField::EndDate]);
    }

    #[test]
    fn change_count_matches_differing_fields() {
        let (u1, u4) = (Uuid::new_v4(), Uuid::new_v4());
        let ev = stored(u1, vec![]);
        let patch = EventPatch {
            created_by: Some(u4),
            timezone: Some("UTC".into()),
            start_time: Some("09:00".into()),
            end_date: Some(date(3)),
            ..Default::default()
        };
        assert_eq!(compute_changes(&ev, &patch).len(), 3);
    }

    #[test]
    fn compute_does_not_touch_stored_event() {
        let ev = stored(Uuid::new_v4(), vec![]);
        let before = ev.clone();
        let _ = compute_changes(
            &ev,
            &EventPatch {
                timezone: Some("UTC".into()),
                ..Default::default()
            },
        );
        assert_eq!(ev, before);
    }

    #[test]
    fn apply_writes_new_values() {
        let (u1, u2, u3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut ev = stored(u1, vec![u2]);
        let patch = EventPatch {
            created_by: Some(u3),
            participants: Some(vec![u1, u1]),
            start_date: Some(date(7)),
            timezone: Some("UTC".into()),
            ..Default::default()
        };
        let changes = compute_changes(&ev, &patch);

        apply_changes(&mut ev, &changes);

        assert_eq!(ev.created_by, u3);
        assert_eq!(ev.participants, vec![u1]);
        assert_eq!(ev.start_date, date(7));
        assert_eq!(ev.timezone, "UTC");
        assert_eq!(ev.end_time, "10:00");
    }
}
