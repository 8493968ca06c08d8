use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query,
    },
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use tracing::{error, info};

use crate::api::rest::dto::{
    CreateEventReq, CreateUserReq, DeleteEventReq, EventDto, EventHistoryDto, ListQuery,
    UpdateEventReq, UserDto,
};
use crate::api::rest::error::{malformed_request, map_domain_error};
use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::contract::model::NewEvent;
use crate::domain::service::Service;
use crate::domain::validation::parse_id;

type ApiResult<T> = Result<T, ProblemResponse>;

/// Register a user profile
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "Created user", body = UserDto),
        (status = 400, description = "Invalid name", body = Problem),
        (status = 409, description = "Name already taken", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "users",
    operation_id = "events_info.create_user"
)]
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserDto>)> {
    let Json(req) = body.map_err(|e| malformed_request(e.body_text(), uri.path()))?;
    info!("Creating user: {:?}", req);

    match svc.create_user(req.into()).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserDto::from(user)))),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// List all user profiles
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Users ordered by creation", body = [UserDto]),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "users",
    operation_id = "events_info.list_users"
)]
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
) -> ApiResult<Json<Vec<UserDto>>> {
    info!("Listing users");

    match svc.list_users().await {
        Ok(users) => Ok(Json(users.into_iter().map(UserDto::from).collect())),
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Create an event
#[utoipa::path(
    post,
    path = "/events",
    request_body = CreateEventReq,
    responses(
        (status = 201, description = "Created event", body = EventDto),
        (status = 400, description = "Missing or malformed field", body = Problem),
        (status = 404, description = "Creator or participant does not exist", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "events",
    operation_id = "events_info.create_event"
)]
pub async fn create_event(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    body: Result<Json<CreateEventReq>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EventDto>)> {
    let Json(req) = body.map_err(|e| malformed_request(e.body_text(), uri.path()))?;
    info!("Creating event: {:?}", req);

    let result = match NewEvent::try_from(req) {
        Ok(new_event) => svc.create_event(new_event).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(ev) => Ok((StatusCode::CREATED, Json(EventDto::from(ev)))),
        Err(e) => {
            error!("Failed to create event: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// List all events
#[utoipa::path(
    get,
    path = "/events",
    params(ListQuery),
    responses(
        (status = 200, description = "Events ordered by creation", body = [EventDto]),
        (status = 400, description = "Invalid paging", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "events",
    operation_id = "events_info.list_events"
)]
pub async fn list_events(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<EventDto>>> {
    let Query(query) = query.map_err(|e| malformed_request(e.body_text(), uri.path()))?;
    info!("Listing events with query: {:?}", query);

    match svc.list_events(svc.page(query.skip, query.limit)).await {
        Ok(events) => Ok(Json(events.into_iter().map(EventDto::from).collect())),
        Err(e) => {
            error!("Failed to list events: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// List events a profile created or participates in
#[utoipa::path(
    get,
    path = "/events/{id}",
    params(
        ("id" = String, Path, description = "Profile (user) id"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Events of the profile", body = [EventDto]),
        (status = 400, description = "Malformed id or paging", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "events",
    operation_id = "events_info.list_profile_events"
)]
pub async fn list_profile_events(
    Extension(svc): Extension<Arc<Service>>,
    Path(profile_id): Path<String>,
    uri: Uri,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<EventDto>>> {
    let Query(query) = query.map_err(|e| malformed_request(e.body_text(), uri.path()))?;
    info!("Listing events for profile {}", profile_id);

    let result = match parse_id("profileId", &profile_id) {
        Ok(id) => {
            svc.list_profile_events(id, svc.page(query.skip, query.limit))
                .await
        }
        Err(e) => Err(e),
    };
    match result {
        Ok(events) => Ok(Json(events.into_iter().map(EventDto::from).collect())),
        Err(e) => {
            error!("Failed to list events for profile {}: {}", profile_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Update an event and record the change in its history
#[utoipa::path(
    put,
    path = "/events/{id}",
    params(("id" = String, Path, description = "Event id")),
    request_body = UpdateEventReq,
    responses(
        (status = 200, description = "Updated event", body = EventDto),
        (status = 400, description = "Malformed input or no net change", body = Problem),
        (status = 403, description = "Actor is neither creator nor participant", body = Problem),
        (status = 404, description = "Event or referenced user not found", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "events",
    operation_id = "events_info.update_event"
)]
pub async fn update_event(
    Extension(svc): Extension<Arc<Service>>,
    Path(event_id): Path<String>,
    uri: Uri,
    body: Result<Json<UpdateEventReq>, JsonRejection>,
) -> ApiResult<Json<EventDto>> {
    let Json(req) = body.map_err(|e| malformed_request(e.body_text(), uri.path()))?;
    info!("Updating event {} with: {:?}", event_id, req);

    let result = async {
        let id = parse_id("id", &event_id)?;
        let (actor_id, patch) = req.into_parts()?;
        svc.update_event(id, actor_id, patch).await
    }
    .await;
    match result {
        Ok(ev) => Ok(Json(EventDto::from(ev))),
        Err(e) => {
            error!("Failed to update event {}: {}", event_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete an event together with its history
#[utoipa::path(
    delete,
    path = "/events/{id}",
    params(("id" = String, Path, description = "Event id")),
    request_body = DeleteEventReq,
    responses(
        (status = 200, description = "Deleted; body is null"),
        (status = 400, description = "Malformed id", body = Problem),
        (status = 403, description = "Actor is neither creator nor participant", body = Problem),
        (status = 404, description = "Event not found", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "events",
    operation_id = "events_info.delete_event"
)]
pub async fn delete_event(
    Extension(svc): Extension<Arc<Service>>,
    Path(event_id): Path<String>,
    uri: Uri,
    body: Result<Json<DeleteEventReq>, JsonRejection>,
) -> ApiResult<Json<()>> {
    let Json(req) = body.map_err(|e| malformed_request(e.body_text(), uri.path()))?;
    info!("Deleting event {}", event_id);

    let result = async {
        let id = parse_id("id", &event_id)?;
        let actor_id = req.actor_id()?;
        svc.delete_event(id, actor_id).await
    }
    .await;
    match result {
        Ok(()) => Ok(Json(())),
        Err(e) => {
            error!("Failed to delete event {}: {}", event_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Formatted update history of an event
#[utoipa::path(
    get,
    path = "/events/{id}/history/{user_id}",
    params(
        ("id" = String, Path, description = "Event id"),
        ("user_id" = String, Path, description = "Acting user id")
    ),
    responses(
        (status = 200, description = "History entries in update order", body = EventHistoryDto),
        (status = 400, description = "Malformed id", body = Problem),
        (status = 403, description = "Actor is neither creator nor participant", body = Problem),
        (status = 404, description = "Event not found", body = Problem),
        (status = 500, description = "Internal error", body = Problem)
    ),
    tag = "events",
    operation_id = "events_info.event_history"
)]
pub async fn event_history(
    Extension(svc): Extension<Arc<Service>>,
    Path((event_id, user_id)): Path<(String, String)>,
    uri: Uri,
) -> ApiResult<Json<EventHistoryDto>> {
    info!("Reading history of event {} for {}", event_id, user_id);

    let result = async {
        let id = parse_id("id", &event_id)?;
        let actor_id = parse_id("userId", &user_id)?;
        svc.event_history(id, actor_id).await
    }
    .await;
    match result {
        Ok(history) => Ok(Json(EventHistoryDto::from(history))),
        Err(e) => {
            error!("Failed to read history of event {}: {}", event_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}
