use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount the events_info REST surface onto `router`.
///
/// `GET /events/{id}` lists the events of a profile while `PUT`/`DELETE` on the
/// same path address one event; the path segment is named `id` for all three.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        .route(
            "/users",
            post(handlers::create_user).get(handlers::list_users),
        )
        .route(
            "/events",
            post(handlers::create_event).get(handlers::list_events),
        )
        .route(
            "/events/{id}",
            get(handlers::list_profile_events)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
        .route(
            "/events/{id}/history/{user_id}",
            get(handlers::event_history),
        )
        .layer(Extension(service))
}
