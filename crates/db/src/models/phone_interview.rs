//! AI phone screens reached through a tokenized public link.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use talentdesk_core::types::{DbId, Timestamp};

/// A row from the `phone_interviews` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhoneInterview {
    pub id: DbId,
    pub job_id: Option<DbId>,
    pub candidate_name: String,
    pub candidate_phone: Option<String>,
    pub token: String,
    pub status: String,
    pub scheduled_at: Option<Timestamp>,
    pub expires_at: Timestamp,
    pub questions: serde_json::Value,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// What the candidate sees on the public page. Internal fields stay
/// server-side.
#[derive(Debug, Clone, Serialize)]
pub struct PublicPhoneInterview {
    pub candidate_name: String,
    pub status: String,
    pub scheduled_at: Option<Timestamp>,
    pub expires_at: Timestamp,
    pub questions: serde_json::Value,
}

impl From<PhoneInterview> for PublicPhoneInterview {
    fn from(interview: PhoneInterview) -> Self {
        Self {
            candidate_name: interview.candidate_name,
            status: interview.status,
            scheduled_at: interview.scheduled_at,
            expires_at: interview.expires_at,
            questions: interview.questions,
        }
    }
}

/// Body of `POST /phone-interviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhoneInterview {
    pub job_id: Option<DbId>,
    pub candidate_name: String,
    pub candidate_phone: Option<String>,
    pub scheduled_at: Option<Timestamp>,
    /// Link lifetime; defaults to seven days.
    pub valid_for_days: Option<i64>,
    #[serde(default)]
    pub questions: Vec<String>,
}

/// Body of `POST /phone-interview/{token}/complete`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletePhoneInterview {
    pub transcript: String,
    pub summary: Option<String>,
}
