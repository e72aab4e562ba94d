//! Route definitions for the dashboard.

use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Create the dashboard router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config().max_upload_bytes;

    Router::new()
        .route("/", get(handlers::home))
        .route("/setup", post(handlers::setup))
        .route(
            "/members",
            get(handlers::members_list).post(handlers::member_create),
        )
        .route("/members/new", get(handlers::member_new))
        .route(
            "/members/{id}",
            get(handlers::member_edit).post(handlers::member_update),
        )
        .route("/members/{id}/delete", post(handlers::member_delete))
        .route("/export", get(handlers::export))
        .route(
            "/import",
            get(handlers::import_form).post(handlers::import_upload),
        )
        .route(
            "/import/{token}",
            get(handlers::import_mapping).post(handlers::import_run),
        )
        .route(
            "/fields",
            get(handlers::fields_list).post(handlers::fields_create),
        )
        .route("/fields/{id}/delete", post(handlers::fields_delete))
        .route(
            "/settings",
            get(handlers::settings).post(handlers::settings_save),
        )
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
