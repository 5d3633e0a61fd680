//! Route definitions for the `/offers` resource.
//!
//! `/{id}/viewed` is public: it is hit from the tracking link in the
//! offer email.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::offers;
use crate::state::AppState;

/// Routes mounted at `/offers`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /{id}                -> get_by_id
/// PUT    /{id}                -> update
/// GET    /{id}/actions        -> actions
/// POST   /{id}/submit         -> submit
/// POST   /{id}/approve        -> approve (admin)
/// POST   /{id}/accept         -> accept
/// POST   /{id}/counter        -> counter
/// POST   /{id}/reject         -> reject
/// POST   /{id}/withdraw       -> withdraw
/// GET    /{id}/email-preview  -> email_preview
/// POST   /{id}/send           -> send
/// POST   /{id}/viewed         -> viewed (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(offers::list).post(offers::create))
        .route("/{id}", get(offers::get_by_id).put(offers::update))
        .route("/{id}/actions", get(offers::actions))
        .route("/{id}/submit", post(offers::submit))
        .route("/{id}/approve", post(offers::approve))
        .route("/{id}/accept", post(offers::accept))
        .route("/{id}/counter", post(offers::counter))
        .route("/{id}/reject", post(offers::reject))
        .route("/{id}/withdraw", post(offers::withdraw))
        .route("/{id}/email-preview", get(offers::email_preview))
        .route("/{id}/send", post(offers::send))
        .route("/{id}/viewed", post(offers::viewed))
}
