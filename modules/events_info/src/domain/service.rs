use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::EventsInfoConfig;
use crate::contract::model::{
    Event, EventHistory, EventPatch, EventView, NewEvent, NewUser, Page, User, UserRef,
};
use crate::domain::access::authorize;
use crate::domain::change_set::ChangeRecord;
use crate::domain::diff::{dedup_participants, require_changes};
use crate::domain::error::DomainError;
use crate::domain::history::{HistoryFormat, HistoryFormatter, UNKNOWN_USER};
use crate::domain::repo::{EventsRepository, UsersRepository};
use crate::domain::validation::{non_blank, validate_clock_time};

/// Domain service orchestrating events, their update history and user profiles.
/// Depends only on the repository ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    events: Arc<dyn EventsRepository>,
    users: Arc<dyn UsersRepository>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_user_name_length: usize,
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub history_date_format: String,
    pub history_timestamp_format: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from(&EventsInfoConfig::default())
    }
}

impl From<&EventsInfoConfig> for ServiceConfig {
    fn from(cfg: &EventsInfoConfig) -> Self {
        Self {
            max_user_name_length: cfg.max_user_name_length,
            default_page_size: cfg.default_page_size,
            max_page_size: cfg.max_page_size,
            history_date_format: cfg.history_date_format.clone(),
            history_timestamp_format: cfg.history_timestamp_format.clone(),
        }
    }
}

impl Service {
    pub fn new(
        events: Arc<dyn EventsRepository>,
        users: Arc<dyn UsersRepository>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            events,
            users,
            config,
        }
    }

    /// Build a page window from optional query parameters.
    pub fn page(&self, skip: Option<u64>, limit: Option<u64>) -> Page {
        Page {
            skip: skip.unwrap_or(0),
            limit: limit.unwrap_or(self.config.default_page_size),
        }
    }

    // --- users ---

    #[instrument(name = "events_info.service.create_user", skip(self), fields(name = %new_user.name))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        let name = self.validate_user_name(&new_user.name)?;
        if self
            .users
            .name_exists(&name)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::user_already_exists(name));
        }

        let user = User {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        };
        // A concurrent request may have taken the name since the check above
        let inserted = self
            .users
            .insert(user.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !inserted {
            return Err(DomainError::user_already_exists(user.name));
        }

        info!("Successfully created user with id={}", user.id);
        Ok(user)
    }

    #[instrument(name = "events_info.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        debug!("Listing users");
        let users = self
            .users
            .list()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Listed {} users", users.len());
        Ok(users)
    }

    // --- events ---

    #[instrument(
        name = "events_info.service.create_event",
        skip(self, new_event),
        fields(created_by = %new_event.created_by)
    )]
    pub async fn create_event(&self, new_event: NewEvent) -> Result<EventView, DomainError> {
        info!("Creating new event");

        let timezone = non_blank(Some(&new_event.timezone))
            .ok_or_else(|| DomainError::missing_field("timezone"))?
            .to_string();
        let start_time = validate_clock_time("startTime", &new_event.start_time)?;
        let end_time = validate_clock_time("endTime", &new_event.end_time)?;
        let participants = dedup_participants(new_event.participants);

        let mut referenced = vec![new_event.created_by];
        referenced.extend(participants.iter().copied());
        self.ensure_users_exist(&referenced).await?;

        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            created_by: new_event.created_by,
            participants,
            timezone,
            start_date: new_event.start_date,
            start_time,
            end_date: new_event.end_date,
            end_time,
            created_at: now,
            updated_at: now,
        };
        self.events
            .insert(event.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!("Successfully created event with id={}", event.id);
        self.resolve_one(event).await
    }

    #[instrument(name = "events_info.service.list_events", skip(self))]
    pub async fn list_events(&self, page: Page) -> Result<Vec<EventView>, DomainError> {
        debug!("Listing all events");
        let page = self.check_page(page)?;
        let events = self
            .events
            .list_all(page)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        self.resolve_views(events).await
    }

    #[instrument(
        name = "events_info.service.list_profile_events",
        skip(self),
        fields(profile_id = %profile_id)
    )]
    pub async fn list_profile_events(
        &self,
        profile_id: Uuid,
        page: Page,
    ) -> Result<Vec<EventView>, DomainError> {
        debug!("Listing events for profile");
        let page = self.check_page(page)?;
        let events = self
            .events
            .list_for_profile(profile_id, page)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Found {} events for profile", events.len());
        self.resolve_views(events).await
    }

    /// Lookup, authorize, diff, then append the change record together with the field update.
    #[instrument(
        name = "events_info.service.update_event",
        skip(self, patch),
        fields(event_id = %event_id, actor_id = %actor_id)
    )]
    pub async fn update_event(
        &self,
        event_id: Uuid,
        actor_id: Uuid,
        patch: EventPatch,
    ) -> Result<EventView, DomainError> {
        info!("Updating event");

        let patch = normalize_patch(patch)?;
        let current = self.load_event(event_id).await?;
        authorize(&current, actor_id)?;

        let changes = require_changes(&current, &patch)?;
        let mut referenced = Vec::new();
        if let Some(created_by) = patch.created_by {
            referenced.push(created_by);
        }
        if let Some(participants) = &patch.participants {
            referenced.extend(participants.iter().copied());
        }
        self.ensure_users_exist(&referenced).await?;

        let record = ChangeRecord {
            updated_by: actor_id,
            updated_at: Utc::now(),
            changes,
        };
        let updated = self
            .events
            .append_change(event_id, &record)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::event_not_found(event_id))?;

        info!(
            changed_fields = record.changes.len(),
            "Successfully updated event"
        );
        self.resolve_one(updated).await
    }

    #[instrument(
        name = "events_info.service.delete_event",
        skip(self),
        fields(event_id = %event_id, actor_id = %actor_id)
    )]
    pub async fn delete_event(&self, event_id: Uuid, actor_id: Uuid) -> Result<(), DomainError> {
        info!("Deleting event");

        let current = self.load_event(event_id).await?;
        authorize(&current, actor_id)?;

        let deleted = self
            .events
            .delete(event_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !deleted {
            return Err(DomainError::event_not_found(event_id));
        }

        info!("Successfully deleted event");
        Ok(())
    }

    #[instrument(
        name = "events_info.service.event_history",
        skip(self),
        fields(event_id = %event_id, actor_id = %actor_id)
    )]
    pub async fn event_history(
        &self,
        event_id: Uuid,
        actor_id: Uuid,
    ) -> Result<EventHistory, DomainError> {
        debug!("Reading event history");

        let event = self.load_event(event_id).await?;
        let user_role = authorize(&event, actor_id)?;

        let records = self
            .events
            .history(event_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let mut ids: BTreeSet<Uuid> = BTreeSet::new();
        ids.insert(event.created_by);
        ids.extend(event.participants.iter().copied());
        for record in &records {
            ids.insert(record.updated_by);
            ids.extend(record.changes.referenced_ids());
        }
        let names = self.names_for(ids.into_iter().collect()).await?;

        let format = HistoryFormat {
            date_format: &self.config.history_date_format,
            timestamp_format: &self.config.history_timestamp_format,
        };
        let history: Vec<_> = HistoryFormatter::new(&records, &names, format)
            .entries()
            .collect();

        debug!(
            stored = records.len(),
            shown = history.len(),
            "Formatted event history"
        );
        Ok(EventHistory {
            event_id,
            created_by: names
                .get(&event.created_by)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_USER.to_string()),
            user_role,
            total_changes: history.len(),
            history,
        })
    }

    // --- helpers ---

    async fn load_event(&self, id: Uuid) -> Result<Event, DomainError> {
        self.events
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::event_not_found(id))
    }

    async fn names_for(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, String>, DomainError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.users
            .names_by_ids(&ids)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    async fn ensure_users_exist(&self, ids: &[Uuid]) -> Result<(), DomainError> {
        let names = self.names_for(ids.to_vec()).await?;
        match ids.iter().find(|id| !names.contains_key(id)) {
            Some(missing) => Err(DomainError::user_not_found(*missing)),
            None => Ok(()),
        }
    }

    async fn resolve_one(&self, event: Event) -> Result<EventView, DomainError> {
        let mut views = self.resolve_views(vec![event]).await?;
        views
            .pop()
            .ok_or_else(|| DomainError::database("resolved view missing"))
    }

    /// Attach display names with a single lookup for the whole batch.
    async fn resolve_views(&self, events: Vec<Event>) -> Result<Vec<EventView>, DomainError> {
        let ids: BTreeSet<Uuid> = events
            .iter()
            .flat_map(|e| std::iter::once(e.created_by).chain(e.participants.iter().copied()))
            .collect();
        let names = self.names_for(ids.into_iter().collect()).await?;

        let user_ref = |id: Uuid| UserRef {
            id,
            name: names.get(&id).cloned(),
        };
        Ok(events
            .into_iter()
            .map(|e| EventView {
                id: e.id,
                created_by: user_ref(e.created_by),
                participants: e.participants.iter().map(|id| user_ref(*id)).collect(),
                timezone: e.timezone,
                start_date: e.start_date,
                start_time: e.start_time,
                end_date: e.end_date,
                end_time: e.end_time,
                created_at: e.created_at,
                updated_at: e.updated_at,
            })
            .collect())
    }

    fn check_page(&self, page: Page) -> Result<Page, DomainError> {
        if page.limit == 0 {
            return Err(DomainError::invalid_argument(
                "limit",
                "must be greater than 0",
            ));
        }
        if page.skip > i64::MAX as u64 {
            return Err(DomainError::invalid_argument(
                "skip",
                format!("must be at most {}", i64::MAX),
            ));
        }
        Ok(Page {
            skip: page.skip,
            limit: page.limit.min(self.config.max_page_size),
        })
    }

    fn validate_user_name(&self, raw: &str) -> Result<String, DomainError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(DomainError::missing_field("name"));
        }
        if name.chars().count() > self.config.max_user_name_length {
            return Err(DomainError::invalid_argument(
                "name",
                format!(
                    "must be at most {} characters",
                    self.config.max_user_name_length
                ),
            ));
        }
        Ok(name.to_string())
    }
}

/// Blank strings count as not submitted; submitted times must be `HH:MM`.
fn normalize_patch(patch: EventPatch) -> Result<EventPatch, DomainError> {
    let text = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    Ok(EventPatch {
        created_by: patch.created_by,
        participants: patch.participants.map(dedup_participants),
        timezone: text(patch.timezone),
        start_date: patch.start_date,
        start_time: text(patch.start_time)
            .map(|t| validate_clock_time("startTime", &t))
            .transpose()?,
        end_date: patch.end_date,
        end_time: text(patch.end_time)
            .map(|t| validate_clock_time("endTime", &t))
            .transpose()?,
    })
}
