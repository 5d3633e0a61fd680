//! Outreach campaigns with their embedded step sequence.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use talentdesk_core::campaign::{CampaignCounters, CampaignStatus};
use talentdesk_core::sequence::SequenceStep;
use talentdesk_core::types::{DbId, Timestamp};

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: DbId,
    pub name: String,
    pub job_id: Option<DbId>,
    pub description: Option<String>,
    pub sequence: Json<Vec<SequenceStep>>,
    pub status: String,
    pub total_recipients: i64,
    pub messages_sent: i64,
    pub messages_opened: i64,
    pub messages_clicked: i64,
    pub messages_replied: i64,
    pub messages_bounced: i64,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Campaign {
    pub fn counters(&self) -> CampaignCounters {
        CampaignCounters {
            total_recipients: self.total_recipients,
            messages_sent: self.messages_sent,
            messages_opened: self.messages_opened,
            messages_clicked: self.messages_clicked,
            messages_replied: self.messages_replied,
            messages_bounced: self.messages_bounced,
        }
    }
}

/// Body of `POST /campaigns`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaign {
    pub name: String,
    pub job_id: Option<DbId>,
    pub description: Option<String>,
    #[serde(default)]
    pub sequence: Vec<SequenceStep>,
}

/// Body of `PUT /campaigns/{id}`.
///
/// `sequence`, when present, replaces the whole list and is renumbered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCampaign {
    pub name: Option<String>,
    pub job_id: Option<DbId>,
    pub description: Option<String>,
    pub sequence: Option<Vec<SequenceStep>>,
}

/// Body of `PATCH /campaigns/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCampaignStatus {
    pub status: CampaignStatus,
}
