use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventsInfoError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("User {actor_id} is not allowed to access event {event_id}")]
    Forbidden { actor_id: Uuid, event_id: Uuid },

    #[error("{message}")]
    NotFound { message: String },

    #[error("No changes detected for event {event_id}")]
    NoChanges { event_id: Uuid },

    #[error("User with name '{name}' already exists")]
    Conflict { name: String },

    #[error("Internal error")]
    Internal,
}

impl EventsInfoError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn forbidden(actor_id: Uuid, event_id: Uuid) -> Self {
        Self::Forbidden { actor_id, event_id }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn no_changes(event_id: Uuid) -> Self {
        Self::NoChanges { event_id }
    }

    pub fn conflict(name: String) -> Self {
        Self::Conflict { name }
    }

    pub fn internal() -> Self {
        Self::Internal
    }

    /// Machine-stable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "InvalidArgument",
            Self::Forbidden { .. } => "Forbidden",
            Self::NotFound { .. } => "NotFound",
            Self::NoChanges { .. } => "NoChanges",
            Self::Conflict { .. } => "Conflict",
            Self::Internal => "InternalFailure",
        }
    }
}

impl From<crate::domain::error::DomainError> for EventsInfoError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            InvalidArgument { field, message } => {
                Self::invalid_argument(format!("{}: {}", field, message))
            }
            Forbidden { actor_id, event_id } => Self::forbidden(actor_id, event_id),
            EventNotFound { id } => Self::not_found(format!("Event not found: {}", id)),
            UserNotFound { id } => Self::not_found(format!("User not found: {}", id)),
            NoChanges { event_id } => Self::no_changes(event_id),
            UserAlreadyExists { name } => Self::conflict(name),
            Database { .. } => Self::internal(),
        }
    }
}
