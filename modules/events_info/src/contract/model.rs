use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Pure user model for inter-module communication (no serde/utoipa)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
}

/// Stored event state. Participants have set semantics; their order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: Uuid,
    pub created_by: Uuid,
    pub participants: Vec<Uuid>,
    pub timezone: String,
    pub start_date: NaiveDate,
    pub start_time: String,
    pub end_date: NaiveDate,
    pub end_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// True when `user_id` is the creator or one of the participants.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.created_by == user_id || self.participants.contains(&user_id)
    }
}

/// Data for creating a new event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub created_by: Uuid,
    pub participants: Vec<Uuid>,
    pub timezone: String,
    pub start_date: NaiveDate,
    pub start_time: String,
    pub end_date: NaiveDate,
    pub end_time: String,
}

/// Partial update data for an event. `None` means "not submitted".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventPatch {
    pub created_by: Option<Uuid>,
    pub participants: Option<Vec<Uuid>>,
    pub timezone: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<String>,
}

/// A user reference with its display name resolved when the user is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: Uuid,
    pub name: Option<String>,
}

/// Event with creator and participants resolved to display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventView {
    pub id: Uuid,
    pub created_by: UserRef,
    pub participants: Vec<UserRef>,
    pub timezone: String,
    pub start_date: NaiveDate,
    pub start_time: String,
    pub end_date: NaiveDate,
    pub end_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Skip/limit window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

/// How the actor relates to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Creator,
    Participant,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Creator => "creator",
            UserRole::Participant => "participant",
        }
    }
}

/// One rendered field change inside a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryChange {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub change_type: &'static str,
}

/// One rendered change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub updated_by: String,
    pub updated_at: String,
    pub changes: Vec<HistoryChange>,
}

/// Display-ready audit trail of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHistory {
    pub event_id: Uuid,
    pub created_by: String,
    pub user_role: UserRole,
    pub total_changes: usize,
    pub history: Vec<HistoryEntry>,
}
