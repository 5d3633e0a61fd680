//! Route definitions for outreach campaigns.

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::handlers::campaigns;
use crate::state::AppState;

/// Routes mounted at `/campaigns`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// PATCH  /{id}/status               -> update_status
/// POST   /{id}/steps                -> add_step
/// POST   /{id}/steps/move           -> move_step
/// DELETE /{id}/steps/{step_number}  -> delete_step
/// POST   /{id}/recipients           -> add_recipients
/// POST   /{id}/send                 -> send
/// GET    /{id}/messages             -> list_messages
/// GET    /{id}/analytics            -> analytics
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(campaigns::list).post(campaigns::create))
        .route("/{id}", get(campaigns::get_by_id).put(campaigns::update))
        .route("/{id}/status", patch(campaigns::update_status))
        .route("/{id}/steps", post(campaigns::add_step))
        .route("/{id}/steps/move", post(campaigns::move_step))
        .route("/{id}/steps/{step_number}", delete(campaigns::delete_step))
        .route("/{id}/recipients", post(campaigns::add_recipients))
        .route("/{id}/send", post(campaigns::send))
        .route("/{id}/messages", get(campaigns::list_messages))
        .route("/{id}/analytics", get(campaigns::analytics))
}
