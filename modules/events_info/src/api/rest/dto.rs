use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::contract::model::{
    EventHistory, EventPatch, EventView, HistoryChange, HistoryEntry, NewEvent, NewUser, User,
    UserRef,
};
use crate::domain::error::DomainError;
use crate::domain::validation::{non_blank, parse_calendar_date, parse_id, require_id};

// Request bodies keep every field optional so a missing field is reported as
// an invalid argument naming that field instead of a generic decode failure.

/// REST DTO for user representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// REST DTO for creating a new user
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateUserReq {
    pub name: Option<String>,
}

/// Creator or participant with the display name resolved when known
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRefDto {
    pub id: Uuid,
    pub name: Option<String>,
}

/// REST DTO for event representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: Uuid,
    pub created_by: UserRefDto,
    pub participants: Vec<UserRefDto>,
    pub timezone: String,
    pub start_date: NaiveDate,
    pub start_time: String,
    pub end_date: NaiveDate,
    pub end_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// REST DTO for creating an event
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateEventReq {
    pub created_by: Option<String>,
    pub participants: Option<Vec<String>>,
    pub timezone: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub start_date: Option<String>,
    /// `HH:MM`, 24h
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
}

/// REST DTO for a partial event update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateEventReq {
    /// Acting user; must be the creator or a participant
    pub user_id: Option<String>,
    pub created_by: Option<String>,
    pub participants: Option<Vec<String>>,
    pub timezone: Option<String>,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
}

/// REST DTO for deleting an event
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteEventReq {
    pub user_id: Option<String>,
}

/// Skip/limit query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Number of events to skip
    pub skip: Option<u64>,
    /// Maximum number of events to return
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryChangeDto {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub change_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryDto {
    pub updated_by: String,
    pub updated_at: String,
    pub changes: Vec<HistoryChangeDto>,
}

/// Formatted update history of an event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventHistoryDto {
    pub event_id: Uuid,
    pub created_by: String,
    /// `creator` or `participant`
    pub user_role: String,
    pub total_changes: usize,
    pub history: Vec<HistoryEntryDto>,
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            name: req.name.unwrap_or_default(),
        }
    }
}

impl From<UserRef> for UserRefDto {
    fn from(r: UserRef) -> Self {
        Self {
            id: r.id,
            name: r.name,
        }
    }
}

impl From<EventView> for EventDto {
    fn from(ev: EventView) -> Self {
        Self {
            id: ev.id,
            created_by: ev.created_by.into(),
            participants: ev.participants.into_iter().map(Into::into).collect(),
            timezone: ev.timezone,
            start_date: ev.start_date,
            start_time: ev.start_time,
            end_date: ev.end_date,
            end_time: ev.end_time,
            created_at: ev.created_at,
            updated_at: ev.updated_at,
        }
    }
}

impl TryFrom<CreateEventReq> for NewEvent {
    type Error = DomainError;

    fn try_from(req: CreateEventReq) -> Result<Self, Self::Error> {
        Ok(Self {
            created_by: require_id("createdBy", req.created_by.as_deref())?,
            participants: parse_ids(req.participants.unwrap_or_default())?,
            timezone: required_text("timezone", req.timezone)?,
            start_date: required_date("startDate", req.start_date.as_deref())?,
            start_time: required_text("startTime", req.start_time)?,
            end_date: required_date("endDate", req.end_date.as_deref())?,
            end_time: required_text("endTime", req.end_time)?,
        })
    }
}

impl UpdateEventReq {
    /// Split into the acting user and the submitted patch. Blank values count as not submitted.
    pub fn into_parts(self) -> Result<(Uuid, EventPatch), DomainError> {
        let actor_id = require_id("userId", self.user_id.as_deref())?;
        let patch = EventPatch {
            created_by: non_blank(self.created_by.as_deref())
                .map(|raw| parse_id("createdBy", raw))
                .transpose()?,
            participants: self.participants.map(parse_ids).transpose()?,
            timezone: self.timezone,
            start_date: optional_date("startDate", self.start_date.as_deref())?,
            start_time: self.start_time,
            end_date: optional_date("endDate", self.end_date.as_deref())?,
            end_time: self.end_time,
        };
        Ok((actor_id, patch))
    }
}

impl DeleteEventReq {
    pub fn actor_id(&self) -> Result<Uuid, DomainError> {
        require_id("userId", self.user_id.as_deref())
    }
}

impl From<HistoryChange> for HistoryChangeDto {
    fn from(c: HistoryChange) -> Self {
        Self {
            field: c.field,
            old_value: c.old_value,
            new_value: c.new_value,
            change_type: c.change_type.to_string(),
        }
    }
}

impl From<HistoryEntry> for HistoryEntryDto {
    fn from(e: HistoryEntry) -> Self {
        Self {
            updated_by: e.updated_by,
            updated_at: e.updated_at,
            changes: e.changes.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<EventHistory> for EventHistoryDto {
    fn from(h: EventHistory) -> Self {
        Self {
            event_id: h.event_id,
            created_by: h.created_by,
            user_role: h.user_role.as_str().to_string(),
            total_changes: h.total_changes,
            history: h.history.into_iter().map(Into::into).collect(),
        }
    }
}

fn parse_ids(raw: Vec<String>) -> Result<Vec<Uuid>, DomainError> {
    raw.iter().map(|id| parse_id("participants", id)).collect()
}

fn required_text(field: &str, raw: Option<String>) -> Result<String, DomainError> {
    match raw {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DomainError::missing_field(field)),
    }
}

fn required_date(field: &str, raw: Option<&str>) -> Result<NaiveDate, DomainError> {
    match non_blank(raw) {
        Some(value) => parse_calendar_date(field, value),
        None => Err(DomainError::missing_field(field)),
    }
}

fn optional_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, DomainError> {
    non_blank(raw)
        .map(|value| parse_calendar_date(field, value))
        .transpose()
}
