//! Route definitions for the `/assessments` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::assessments;
use crate::state::AppState;

/// Routes mounted at `/assessments`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create
/// GET    /{id}          -> get_by_id
/// PATCH  /{id}/status   -> update_status
/// POST   /{id}/review   -> review
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(assessments::list).post(assessments::create))
        .route("/{id}", get(assessments::get_by_id))
        .route("/{id}/status", patch(assessments::update_status))
        .route("/{id}/review", post(assessments::review))
}
