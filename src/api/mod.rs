//! HTTP routes over [`NoteService`](crate::service::NoteService).
//!
//! Every route is scoped by a user id path segment. Errors are returned as
//! `{error, error_code}` JSON bodies.

pub mod error;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::service::NoteService;

pub fn router(service: NoteService) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/users/{user_id}/notes", get(handlers::list_notes))
        .route(
            "/users/{user_id}/notes/{*path}",
            get(handlers::read_note)
                .put(handlers::write_note)
                .delete(handlers::delete_note),
        )
        .route("/users/{user_id}/search", post(handlers::search))
        .route("/users/{user_id}/ask", post(handlers::ask))
        .route("/users/{user_id}/reindex", post(handlers::reindex))
        .route("/users/{user_id}/profile", post(handlers::write_profile))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
