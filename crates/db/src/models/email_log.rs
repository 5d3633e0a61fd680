//! Ad-hoc emails handed to the outreach service.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use talentdesk_core::types::{DbId, Timestamp};

/// A row from the `email_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailLog {
    pub id: DbId,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub related_entity: Option<String>,
    pub related_id: Option<DbId>,
    pub status: String,
    pub external_id: Option<String>,
    pub error_message: Option<String>,
    pub sent_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /emails/send`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub related_entity: Option<String>,
    pub related_id: Option<DbId>,
}
