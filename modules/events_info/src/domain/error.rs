use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid argument: {field}: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("User {actor_id} is neither creator nor participant of event {event_id}")]
    Forbidden { actor_id: Uuid, event_id: Uuid },

    #[error("Event not found: {id}")]
    EventNotFound { id: Uuid },

    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("No changes detected for event {event_id}")]
    NoChanges { event_id: Uuid },

    #[error("User with name '{name}' already exists")]
    UserAlreadyExists { name: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::invalid_argument(field, "is required")
    }

    pub fn forbidden(actor_id: Uuid, event_id: Uuid) -> Self {
        Self::Forbidden { actor_id, event_id }
    }

    pub fn event_not_found(id: Uuid) -> Self {
        Self::EventNotFound { id }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn no_changes(event_id: Uuid) -> Self {
        Self::NoChanges { event_id }
    }

    pub fn user_already_exists(name: String) -> Self {
        Self::UserAlreadyExists { name }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
