//! Delivery callbacks from the outreach service.

use axum::routing::post;
use axum::Router;

use crate::handlers::outreach;
use crate::state::AppState;

/// Routes mounted at `/outreach`.
///
/// ```text
/// POST   /events  -> record_event (service key, not a user session)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/events", post(outreach::record_event))
}
