//! OpenAPI document for the events_info REST surface.

use utoipa::OpenApi;

use crate::api::rest::{dto, handlers, problem};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EventSync API",
        description = "Events with creator/participant access control and a field-level update history."
    ),
    paths(
        handlers::create_user,
        handlers::list_users,
        handlers::create_event,
        handlers::list_events,
        handlers::list_profile_events,
        handlers::update_event,
        handlers::delete_event,
        handlers::event_history,
    ),
    components(schemas(
        dto::UserDto,
        dto::CreateUserReq,
        dto::UserRefDto,
        dto::EventDto,
        dto::CreateEventReq,
        dto::UpdateEventReq,
        dto::DeleteEventReq,
        dto::HistoryChangeDto,
        dto::HistoryEntryDto,
        dto::EventHistoryDto,
        problem::Problem,
    )),
    tags(
        (name = "users", description = "User profiles"),
        (name = "events", description = "Events and their update history")
    )
)]
pub struct ApiDoc;
