//! Job postings and their JD payload.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use talentdesk_core::job::{JobStatus, JobType, RemotePolicy, SalaryRange, SkillsMatrix};
use talentdesk_core::types::{DbId, Timestamp};

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub job_type: String,
    pub remote_policy: String,
    pub description: Option<String>,
    pub skills_matrix: Json<SkillsMatrix>,
    pub salary_range: Option<Json<SalaryRange>>,
    pub status: String,
    pub created_by: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `POST /jobs`. New jobs always start as drafts.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJob {
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub remote_policy: Option<RemotePolicy>,
    pub description: Option<String>,
    #[serde(default)]
    pub skills_matrix: SkillsMatrix,
    pub salary_range: Option<SalaryRange>,
}

/// Body of `PUT /jobs/{id}`. Absent fields are left unchanged; status
/// changes go through `PATCH /jobs/{id}/status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateJob {
    pub title: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub remote_policy: Option<RemotePolicy>,
    pub description: Option<String>,
    pub skills_matrix: Option<SkillsMatrix>,
    pub salary_range: Option<SalaryRange>,
}

/// Body of `PATCH /jobs/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateJobStatus {
    pub status: JobStatus,
}
