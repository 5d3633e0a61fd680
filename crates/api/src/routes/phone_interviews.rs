//! Route definitions for phone interviews.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::phone_interviews;
use crate::state::AppState;

/// Recruiter routes mounted at `/phone-interviews`.
///
/// ```text
/// POST   /              -> create
/// POST   /{id}/cancel   -> cancel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(phone_interviews::create))
        .route("/{id}/cancel", post(phone_interviews::cancel))
}

/// Candidate-facing routes mounted at `/phone-interview`. The token is
/// the only credential.
///
/// ```text
/// GET    /{token}            -> get_by_token
/// POST   /{token}/start      -> start
/// POST   /{token}/complete   -> complete
/// ```
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/{token}", get(phone_interviews::get_by_token))
        .route("/{token}/start", post(phone_interviews::start))
        .route("/{token}/complete", post(phone_interviews::complete))
}
