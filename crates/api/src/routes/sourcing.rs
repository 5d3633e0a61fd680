//! Route definitions for candidate sourcing.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::sourcing;
use crate::state::AppState;

/// Routes mounted at `/sourcing`.
///
/// ```text
/// POST   /search                   -> search
/// POST   /import                   -> import
/// GET    /candidates               -> list_candidates
/// GET    /candidates/{id}          -> get_candidate
/// PATCH  /candidates/{id}/status   -> update_candidate_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", post(sourcing::search))
        .route("/import", post(sourcing::import))
        .route("/candidates", get(sourcing::list_candidates))
        .route("/candidates/{id}", get(sourcing::get_candidate))
        .route(
            "/candidates/{id}/status",
            patch(sourcing::update_candidate_status),
        )
}
