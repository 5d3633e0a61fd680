//! Route definitions for job requisitions.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /                                -> list
/// POST   /                                -> create
/// GET    /{id}                            -> get_by_id
/// PUT    /{id}                            -> update
/// PATCH  /{id}/status                     -> update_status
/// GET    /{id}/skill-match/{candidate_id} -> skill_match_for_candidate
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list).post(jobs::create))
        .route("/{id}", get(jobs::get_by_id).put(jobs::update))
        .route("/{id}/status", patch(jobs::update_status))
        .route(
            "/{id}/skill-match/{candidate_id}",
            get(jobs::skill_match_for_candidate),
        )
}

/// Routes mounted at `/jd`, the job-description approval flow.
///
/// ```text
/// POST   /{id}/approve-with-sourcing      -> approve_with_sourcing
/// ```
pub fn jd_router() -> Router<AppState> {
    Router::new().route(
        "/{id}/approve-with-sourcing",
        post(jobs::approve_with_sourcing),
    )
}
