//! Per-recipient, per-step outreach messages.

use serde::Serialize;
use sqlx::FromRow;
use talentdesk_core::metrics::MessageActivity;
use talentdesk_core::types::{DbId, Timestamp};

/// A row from the `outreach_messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutreachMessage {
    pub id: DbId,
    pub campaign_id: DbId,
    pub sourced_candidate_id: DbId,
    pub step_number: i32,
    pub channel: String,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub body: String,
    pub status: String,
    pub scheduled_for: Timestamp,
    pub sent_at: Option<Timestamp>,
    pub opened_at: Option<Timestamp>,
    pub clicked_at: Option<Timestamp>,
    pub replied_at: Option<Timestamp>,
    pub bounced_at: Option<Timestamp>,
    pub external_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OutreachMessage {
    pub fn activity(&self) -> MessageActivity {
        MessageActivity {
            sent_at: self.sent_at,
            opened_at: self.opened_at,
            clicked_at: self.clicked_at,
            replied_at: self.replied_at,
        }
    }
}

/// A pending message rendered when a recipient joins a campaign.
#[derive(Debug, Clone)]
pub struct NewOutreachMessage {
    pub campaign_id: DbId,
    pub sourced_candidate_id: DbId,
    pub step_number: i32,
    pub channel: String,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub body: String,
    pub scheduled_for: Timestamp,
}
