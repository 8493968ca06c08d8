use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::EventsInfoError,
    model::{EventHistory, EventPatch, EventView, NewEvent, NewUser, Page, User},
};

/// Public API trait for the events_info module that other modules can use
#[async_trait]
pub trait EventsInfoApi: Send + Sync {
    /// Register a new user profile
    async fn create_user(&self, new_user: NewUser) -> Result<User, EventsInfoError>;

    /// List all user profiles
    async fn list_users(&self) -> Result<Vec<User>, EventsInfoError>;

    /// Create a new event
    async fn create_event(&self, new_event: NewEvent) -> Result<EventView, EventsInfoError>;

    /// List all events ordered by creation time
    async fn list_events(&self, page: Page) -> Result<Vec<EventView>, EventsInfoError>;

    /// List events where the profile is creator or participant
    async fn list_profile_events(
        &self,
        profile_id: Uuid,
        page: Page,
    ) -> Result<Vec<EventView>, EventsInfoError>;

    /// Apply a partial update on behalf of `actor_id`, recording it in the event history
    async fn update_event(
        &self,
        event_id: Uuid,
        actor_id: Uuid,
        patch: EventPatch,
    ) -> Result<EventView, EventsInfoError>;

    /// Delete an event together with its history
    async fn delete_event(&self, event_id: Uuid, actor_id: Uuid) -> Result<(), EventsInfoError>;

    /// Render the update history of an event for `actor_id`
    async fn event_history(
        &self,
        event_id: Uuid,
        actor_id: Uuid,
    ) -> Result<EventHistory, EventsInfoError>;
}
