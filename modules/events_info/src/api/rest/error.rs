use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.example.com/{}", code))
        .with_code(code)
        .with_instance(instance);

    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

/// Request body or query string that could not be decoded.
pub fn malformed_request(detail: impl Into<String>, instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::BAD_REQUEST,
        "EVENTS_INVALID_ARGUMENT",
        "Invalid argument",
        detail,
        instance,
    )
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::InvalidArgument { field, message } => from_parts(
            StatusCode::BAD_REQUEST,
            "EVENTS_INVALID_ARGUMENT",
            "Invalid argument",
            format!("{}: {}", field, message),
            instance,
        ),
        DomainError::Forbidden { actor_id, event_id } => from_parts(
            StatusCode::FORBIDDEN,
            "EVENTS_FORBIDDEN",
            "Forbidden",
            format!(
                "User {} is neither creator nor participant of event {}",
                actor_id, event_id
            ),
            instance,
        ),
        DomainError::EventNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "EVENTS_NOT_FOUND",
            "Event not found",
            format!("Event with id {} was not found", id),
            instance,
        ),
        DomainError::UserNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "USERS_NOT_FOUND",
            "User not found",
            format!("User with id {} was not found", id),
            instance,
        ),
        DomainError::NoChanges { event_id } => from_parts(
            StatusCode::BAD_REQUEST,
            "EVENTS_NO_CHANGES",
            "No changes",
            format!("The update does not change event {}", event_id),
            instance,
        ),
        DomainError::UserAlreadyExists { name } => from_parts(
            StatusCode::CONFLICT,
            "USERS_NAME_CONFLICT",
            "Name already exists",
            format!("User name '{}' is already in use", name),
            instance,
        ),
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_DB",
                "Internal error",
                "An internal database error occurred",
                instance,
            )
        }
    }
}
