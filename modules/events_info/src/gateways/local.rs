use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::EventsInfoApi,
    error::EventsInfoError,
    model::{EventHistory, EventPatch, EventView, NewEvent, NewUser, Page, User},
};
use crate::domain::service::Service;

/// Local implementation of the EventsInfoApi trait that delegates to the domain service
pub struct EventsInfoLocalClient {
    service: Arc<Service>,
}

impl EventsInfoLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventsInfoApi for EventsInfoLocalClient {
    async fn create_user(&self, new_user: NewUser) -> Result<User, EventsInfoError> {
        self.service
            .create_user(new_user)
            .await
            .map_err(Into::into)
    }

    async fn list_users(&self) -> Result<Vec<User>, EventsInfoError> {
        self.service.list_users().await.map_err(Into::into)
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<EventView, EventsInfoError> {
        self.service
            .create_event(new_event)
            .await
            .map_err(Into::into)
    }

    async fn list_events(&self, page: Page) -> Result<Vec<EventView>, EventsInfoError> {
        self.service.list_events(page).await.map_err(Into::into)
    }

    async fn list_profile_events(
        &self,
        profile_id: Uuid,
        page: Page,
    ) -> Result<Vec<EventView>, EventsInfoError> {
        self.service
            .list_profile_events(profile_id, page)
            .await
            .map_err(Into::into)
    }

    async fn update_event(
        &self,
        event_id: Uuid,
        actor_id: Uuid,
        patch: EventPatch,
    ) -> Result<EventView, EventsInfoError> {
        self.service
            .update_event(event_id, actor_id, patch)
            .await
            .map_err(Into::into)
    }

    async fn delete_event(&self, event_id: Uuid, actor_id: Uuid) -> Result<(), EventsInfoError> {
        self.service
            .delete_event(event_id, actor_id)
            .await
            .map_err(Into::into)
    }

    async fn event_history(
        &self,
        event_id: Uuid,
        actor_id: Uuid,
    ) -> Result<EventHistory, EventsInfoError> {
        self.service
            .event_history(event_id, actor_id)
            .await
            .map_err(Into::into)
    }
}
