use std::sync::Arc;

use talentdesk_outreach::OutreachGateway;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone; everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: talentdesk_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Delivery path for campaign messages, offer letters and ad-hoc email.
    pub outreach: Arc<dyn OutreachGateway>,
}
