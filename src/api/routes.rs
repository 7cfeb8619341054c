use axum::{
    routing::{delete, post, put},
    Router,
};
use std::sync::Arc;

use crate::AppState;

use super::handlers;

pub fn audit_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::request_audit))
        .route("/report", post(handlers::request_audit_markdown))
}

pub fn tab_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:tab_id", delete(handlers::remove_tab))
        .route(
            "/:tab_id/headers",
            put(handlers::record_headers).get(handlers::get_headers),
        )
}

pub fn console_routes() -> Router<Arc<AppState>> {
    Router::new().route("/console", post(handlers::console_event))
}
