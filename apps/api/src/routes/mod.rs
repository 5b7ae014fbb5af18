pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::mentorship::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session request workflow
        .route(
            "/api/v1/session-requests",
            post(handlers::handle_submit_request),
        )
        .route(
            "/api/v1/session-requests/:guide_id",
            get(handlers::handle_list_requests),
        )
        .route(
            "/api/v1/session-requests/:id/update",
            post(handlers::handle_resolve_request),
        )
        // Sessions
        .route(
            "/api/v1/sessions",
            get(handlers::handle_list_sessions).post(handlers::handle_create_session),
        )
        .route(
            "/api/v1/sessions/guide/:guide_id",
            get(handlers::handle_list_guide_sessions),
        )
        .route(
            "/api/v1/sessions/programmer/:programmer_id",
            get(handlers::handle_list_programmer_sessions),
        )
        // Guides
        .route("/api/v1/guides", get(handlers::handle_list_guides))
        // Notifications
        .route(
            "/api/v1/notify-programmer",
            post(handlers::handle_notify_programmer),
        )
        .route(
            "/api/v1/notifications/:recipient_id",
            get(handlers::handle_list_notifications),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(handlers::handle_mark_notification_read),
        )
        .with_state(state)
}
