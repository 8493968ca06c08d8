use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{Event, Page, User};
use crate::domain::change_set::ChangeRecord;

/// Port for event persistence.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait EventsRepository: Send + Sync {
    /// Load an event with its participants.
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Event>>;
    /// Insert a fully-formed event. History starts empty.
    async fn insert(&self, event: Event) -> anyhow::Result<()>;
    /// All events ordered by creation time.
    async fn list_all(&self, page: Page) -> anyhow::Result<Vec<Event>>;
    /// Events the profile created or participates in, ordered by creation time.
    async fn list_for_profile(&self, profile_id: Uuid, page: Page) -> anyhow::Result<Vec<Event>>;
    /// Apply `record.changes` to the stored event and append `record` to its history
    /// as one atomic write.
    ///
    /// Returns `None` (and writes nothing) when the event does not exist.
    async fn append_change(
        &self,
        event_id: Uuid,
        record: &ChangeRecord,
    ) -> anyhow::Result<Option<Event>>;
    /// Change records in insertion order.
    async fn history(&self, event_id: Uuid) -> anyhow::Result<Vec<ChangeRecord>>;
    /// Delete the event and its history. Returns true if the event existed.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Port for user persistence and name resolution.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a user. Returns false, writing nothing, when the name is already taken.
    async fn insert(&self, user: User) -> anyhow::Result<bool>;
    /// All users ordered by creation time.
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    async fn name_exists(&self, name: &str) -> anyhow::Result<bool>;
    /// Resolve ids to display names. Unknown ids are absent from the result.
    async fn names_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>>;
}
