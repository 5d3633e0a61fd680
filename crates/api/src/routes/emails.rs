use axum::routing::{get, post};
use axum::Router;

use crate::handlers::emails;
use crate::state::AppState;

/// Routes mounted at `/emails`.
///
/// ```text
/// GET    /       -> list
/// POST   /send   -> send
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(emails::list))
        .route("/send", post(emails::send))
}
