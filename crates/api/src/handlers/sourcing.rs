//! Handlers for `/sourcing`: candidate search, bulk import and the
//! sourced-candidate pipeline.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use talentdesk_core::email::validate_email_address;
use talentdesk_core::error::CoreError;
use talentdesk_core::job::{SkillRequirement, SkillsMatrix};
use talentdesk_core::skills::{ranking_weights, skill_match, weighted_fit_score};
use talentdesk_core::sourcing::{split_name, validate_fit_score, CandidateStatus, SearchCriteria};
use talentdesk_core::types::DbId;
use talentdesk_db::models::job::Job;
use talentdesk_db::models::sourced_candidate::{
    CandidateSearch, ImportCandidate, NewSourcedCandidate, SourcedCandidate,
    UpdateCandidateStatus,
};
use talentdesk_db::repositories::SourcedCandidateRepo;

use super::jobs::find_job;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequireRecruiter};
use crate::query::JobStatusFilter;
use crate::response::DataResponse;
use crate::state::AppState;

/// Best-overlap rows pulled from the database before exact scoring and
/// truncation.
const RANKING_POOL: i64 = 500;

/// Largest accepted import batch.
const MAX_IMPORT_BATCH: usize = 1_000;

#[derive(Debug, Serialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub candidate: SourcedCandidate,
    /// Fit against the job, or against the requested skills, or the
    /// stored score, in that order of preference.
    pub match_score: i32,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub job_id: Option<DbId>,
    pub candidates: Vec<ImportCandidate>,
}

#[derive(Debug, Serialize)]
pub struct ImportRejection {
    /// Position in the submitted list, 0-based.
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    /// Existing `(job, email)` rows refreshed in place.
    pub updated: usize,
    pub skipped: usize,
    pub rejections: Vec<ImportRejection>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `%term%` with LIKE wildcards in `term` escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn trimmed(value: &Option<String>) -> Option<String> {
    non_blank(value.as_deref()).map(str::to_string)
}

/// The matrix a search ranks against: the job's, else the requested
/// skills. Empty when neither applies.
fn ranking_matrix<'a>(job: Option<&'a Job>, requested: &'a SkillsMatrix) -> &'a SkillsMatrix {
    match job.filter(|j| !j.skills_matrix.is_empty()) {
        Some(job) => &job.skills_matrix,
        None => requested,
    }
}

/// Score one row for a search.
fn match_score(candidate: &SourcedCandidate, job: Option<&Job>, requested: &SkillsMatrix) -> i32 {
    if let Some(job) = job.filter(|j| !j.skills_matrix.is_empty()) {
        return weighted_fit_score(&candidate.skills, &job.skills_matrix);
    }
    if !requested.is_empty() {
        return skill_match(&candidate.skills, requested).required_match_pct;
    }
    candidate.fit_score.unwrap_or(0)
}

/// Turn one import row into an insertable candidate, or say why not.
fn prepare_import(
    row: &ImportCandidate,
    job_id: Option<DbId>,
    matrix: Option<&SkillsMatrix>,
) -> Result<NewSourcedCandidate, String> {
    let (first_name, last_name) = match (
        non_blank(row.first_name.as_deref()),
        non_blank(row.last_name.as_deref()),
    ) {
        (None, None) => split_name(row.name.as_deref().unwrap_or_default()),
        (first, last) => (
            first.unwrap_or_default().to_string(),
            last.unwrap_or_default().to_string(),
        ),
    };
    if first_name.is_empty() && last_name.is_empty() {
        return Err("Candidate has no name".to_string());
    }

    let email = trimmed(&row.email);
    if let Some(email) = &email {
        validate_email_address(email).map_err(|e| e.to_string())?;
    }

    let skills: Vec<String> = row
        .skills
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let fit_score = match (row.fit_score, matrix) {
        (Some(score), _) => {
            validate_fit_score(score).map_err(|e| e.to_string())?;
            Some(score)
        }
        (None, Some(matrix)) if !matrix.is_empty() => Some(weighted_fit_score(&skills, matrix)),
        (None, _) => None,
    };

    Ok(NewSourcedCandidate {
        job_id,
        first_name,
        last_name,
        email,
        headline: trimmed(&row.headline),
        current_company: trimmed(&row.current_company),
        location: trimmed(&row.location),
        profile_url: trimmed(&row.profile_url),
        source: trimmed(&row.source),
        skills,
        experience_years: row.experience_years.filter(|y| *y >= 0),
        fit_score,
        notes: trimmed(&row.notes),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/sourcing/search
pub async fn search(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Json(criteria): Json<SearchCriteria>,
) -> AppResult<Json<DataResponse<Vec<RankedCandidate>>>> {
    criteria.validate()?;

    let job = match criteria.job_id {
        Some(job_id) => Some(find_job(&state, job_id).await?),
        None => None,
    };

    let skills = criteria.normalized_skills();
    let requested = SkillsMatrix {
        required: skills.iter().cloned().map(SkillRequirement::new).collect(),
        nice_to_have: Vec::new(),
    };
    let (rank_skills, rank_weights) = ranking_weights(ranking_matrix(job.as_ref(), &requested));
    let filter = CandidateSearch {
        keyword_pattern: non_blank(criteria.keywords.as_deref()).map(like_pattern),
        skills,
        location_pattern: non_blank(criteria.location.as_deref()).map(like_pattern),
        job_id: criteria.job_id,
        rank_skills,
        rank_weights,
    };
    let rows = SourcedCandidateRepo::search(&state.pool, &filter, RANKING_POOL).await?;

    let min = criteria.min_fit_score.unwrap_or(0);

    let mut ranked: Vec<RankedCandidate> = rows
        .into_iter()
        .map(|candidate| {
            let match_score = match_score(&candidate, job.as_ref(), &requested);
            RankedCandidate { candidate, match_score }
        })
        .filter(|r| r.match_score >= min)
        .collect();
    ranked.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then(a.candidate.id.cmp(&b.candidate.id))
    });
    ranked.truncate(criteria.clamped_limit() as usize);

    Ok(Json(DataResponse { data: ranked }))
}

/// POST /api/v1/sourcing/import
///
/// Rows are upserted by `(job_id, email)`; invalid rows are skipped and
/// reported, never fatal to the batch.
pub async fn import(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Json(input): Json<ImportRequest>,
) -> AppResult<Json<DataResponse<ImportSummary>>> {
    if input.candidates.len() > MAX_IMPORT_BATCH {
        return Err(AppError::Core(CoreError::Validation(format!(
            "At most {MAX_IMPORT_BATCH} candidates can be imported at once"
        ))));
    }

    let job = match input.job_id {
        Some(job_id) => Some(find_job(&state, job_id).await?),
        None => None,
    };
    let matrix = job.as_ref().map(|j| &j.skills_matrix.0);

    let mut summary = ImportSummary::default();
    for (index, row) in input.candidates.iter().enumerate() {
        let candidate = match prepare_import(row, input.job_id, matrix) {
            Ok(candidate) => candidate,
            Err(reason) => {
                summary.skipped += 1;
                summary.rejections.push(ImportRejection { index, reason });
                continue;
            }
        };
        if SourcedCandidateRepo::upsert(&state.pool, &candidate).await?.inserted {
            summary.imported += 1;
        } else {
            summary.updated += 1;
        }
    }

    tracing::info!(
        job_id = ?input.job_id,
        imported = summary.imported,
        updated = summary.updated,
        skipped = summary.skipped,
        user_id = user.user_id,
        "Candidates imported"
    );
    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/sourcing/candidates?job_id=&status=
pub async fn list_candidates(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(filter): Query<JobStatusFilter>,
) -> AppResult<Json<DataResponse<Vec<SourcedCandidate>>>> {
    let status = filter.parsed_status::<CandidateStatus>()?;
    let candidates =
        SourcedCandidateRepo::list(&state.pool, filter.job_id, status.map(CandidateStatus::as_str))
            .await?;
    Ok(Json(DataResponse { data: candidates }))
}

/// GET /api/v1/sourcing/candidates/{id}
pub async fn get_candidate(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SourcedCandidate>>> {
    let candidate = SourcedCandidateRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SourcedCandidate",
            id,
        }))?;
    Ok(Json(DataResponse { data: candidate }))
}

/// PATCH /api/v1/sourcing/candidates/{id}/status
pub async fn update_candidate_status(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCandidateStatus>,
) -> AppResult<Json<DataResponse<SourcedCandidate>>> {
    let notes = non_blank(input.notes.as_deref());
    let candidate =
        SourcedCandidateRepo::update_status(&state.pool, id, input.status.as_str(), notes)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "SourcedCandidate",
                id,
            }))?;

    tracing::info!(candidate_id = id, status = %input.status, user_id = user.user_id, "Candidate status changed");
    Ok(Json(DataResponse { data: candidate }))
}
