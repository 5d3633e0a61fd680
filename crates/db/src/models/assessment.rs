//! Candidate assessments (video or questionnaire).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use talentdesk_core::assessment::{AssessmentKind, AssessmentStatus, Recommendation};
use talentdesk_core::types::{DbId, Timestamp};

/// A row from the `assessments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assessment {
    pub id: DbId,
    pub job_id: Option<DbId>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub kind: String,
    pub questions: serde_json::Value,
    pub responses: Option<serde_json::Value>,
    pub status: String,
    pub score: Option<i32>,
    pub recommendation: Option<String>,
    pub reviewer_notes: Option<String>,
    pub reviewed_by: Option<DbId>,
    pub completed_at: Option<Timestamp>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /assessments`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssessment {
    pub job_id: Option<DbId>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub kind: Option<AssessmentKind>,
    #[serde(default = "empty_array")]
    pub questions: serde_json::Value,
}

fn empty_array() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

/// Body of `PATCH /assessments/{id}/status`. Candidate responses can be
/// attached when the assessment is completed.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAssessmentStatus {
    pub status: AssessmentStatus,
    pub responses: Option<serde_json::Value>,
}

/// Body of `POST /assessments/{id}/review`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewAssessment {
    pub score: i32,
    pub recommendation: Option<Recommendation>,
    pub notes: Option<String>,
}
