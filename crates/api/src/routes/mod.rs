pub mod assessments;
pub mod auth;
pub mod campaigns;
pub mod emails;
pub mod health;
pub mod jobs;
pub mod offers;
pub mod outreach;
pub mod phone_interviews;
pub mod sourcing;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login, /auth/refresh, /auth/logout         sessions
///
/// /jobs                                            requisitions
/// /jd/{id}/approve-with-sourcing                   approve and source
///
/// /campaigns                                       campaigns and sequences
/// /campaigns/{id}/recipients, /send, /analytics    delivery and metrics
/// /outreach/events                                 delivery callbacks
///
/// /sourcing/search, /sourcing/import               candidate pool
/// /sourcing/candidates                             sourced pipeline
///
/// /offers                                          offer workflow
/// /assessments                                     take-home and screens
///
/// /phone-interviews                                create, cancel (recruiter)
/// /phone-interview/{token}                         candidate page (public)
///
/// /emails                                          ad-hoc email and log
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/jobs", jobs::router())
        .nest("/jd", jobs::jd_router())
        .nest("/campaigns", campaigns::router())
        .nest("/outreach", outreach::router())
        .nest("/sourcing", sourcing::router())
        .nest("/offers", offers::router())
        .nest("/assessments", assessments::router())
        .nest("/phone-interviews", phone_interviews::router())
        .nest("/phone-interview", phone_interviews::public_router())
        .nest("/emails", emails::router())
}
