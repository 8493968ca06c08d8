use uuid::Uuid;

use crate::contract::model::{Event, UserRole};
use crate::domain::error::DomainError;

/// Allow the actor when it is the event creator or a current participant.
///
/// Must be evaluated against the stored event, before any edit is applied.
pub fn authorize(event: &Event, actor_id: Uuid) -> Result<UserRole, DomainError> {
    if event.created_by == actor_id {
        Ok(UserRole::Creator)
    } else if event.participants.contains(&actor_id) {
        Ok(UserRole::Participant)
    } else {
        Err(DomainError::forbidden(actor_id, event.id))
    }
}
