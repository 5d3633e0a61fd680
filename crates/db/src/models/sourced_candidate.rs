//! Prospects found through search or bulk import.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use talentdesk_core::sourcing::CandidateStatus;
use talentdesk_core::types::{DbId, Timestamp};

/// A row from the `sourced_candidates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SourcedCandidate {
    pub id: DbId,
    pub job_id: Option<DbId>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub headline: Option<String>,
    pub current_company: Option<String>,
    pub location: Option<String>,
    pub profile_url: Option<String>,
    pub source: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
    pub fit_score: Option<i32>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SourcedCandidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// An upserted row plus whether it was newly inserted.
#[derive(Debug, Clone, FromRow)]
pub struct UpsertedCandidate {
    #[sqlx(flatten)]
    pub candidate: SourcedCandidate,
    pub inserted: bool,
}

/// One entry of `POST /sourcing/import`.
///
/// Either `name` or `first_name` must be present; `name` is split on the
/// first space.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportCandidate {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub headline: Option<String>,
    pub current_company: Option<String>,
    pub location: Option<String>,
    pub profile_url: Option<String>,
    pub source: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
    pub fit_score: Option<i32>,
    pub notes: Option<String>,
}

/// A validated candidate ready for [`upsert`](crate::repositories::SourcedCandidateRepo::upsert).
#[derive(Debug, Clone)]
pub struct NewSourcedCandidate {
    pub job_id: Option<DbId>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub headline: Option<String>,
    pub current_company: Option<String>,
    pub location: Option<String>,
    pub profile_url: Option<String>,
    pub source: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
    pub fit_score: Option<i32>,
    pub notes: Option<String>,
}

/// Filters for the candidate pool search.
#[derive(Debug, Clone, Default)]
pub struct CandidateSearch {
    /// `ILIKE` pattern over name, headline and company.
    pub keyword_pattern: Option<String>,
    /// Lowercased skills; a row matches if it has any of them.
    pub skills: Vec<String>,
    /// `ILIKE` pattern over location.
    pub location_pattern: Option<String>,
    /// Restrict to candidates attached to this job or to no job.
    pub job_id: Option<DbId>,
    /// Normalized skills to rank by, paired with `rank_weights`. Rows are
    /// ordered by the summed weight of the skills they have; when empty,
    /// by stored fit score.
    pub rank_skills: Vec<String>,
    pub rank_weights: Vec<i32>,
}

/// Body of `PATCH /sourcing/candidates/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCandidateStatus {
    pub status: CandidateStatus,
    pub notes: Option<String>,
}
