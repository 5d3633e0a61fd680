//! Handlers for `/jobs` and the JD approval flow under `/jd`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use talentdesk_core::error::CoreError;
use talentdesk_core::job::{self, JobStatus};
use talentdesk_core::skills::{skill_match, SkillMatch};
use talentdesk_core::types::DbId;
use talentdesk_db::models::job::{CreateJob, Job, UpdateJob, UpdateJobStatus};
use talentdesk_db::models::sourced_candidate::SourcedCandidate;
use talentdesk_db::repositories::{JobRepo, SourcedCandidateRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequireRecruiter};
use crate::query::parse_optional;
use crate::response::DataResponse;
use crate::state::AppState;

/// Most unassigned candidates considered when a JD is approved.
const SOURCING_POOL_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct JobListParams {
    pub status: Option<String>,
}

/// Result of approving a JD.
#[derive(Debug, Serialize)]
pub struct ApprovedJob {
    pub job: Job,
    /// Candidates attached to the job, best fit first.
    pub sourced: Vec<SourcedCandidate>,
}

pub(crate) async fn find_job(state: &AppState, id: DbId) -> AppResult<Job> {
    JobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Job", id }))
}

fn validate_create(input: &CreateJob) -> Result<(), CoreError> {
    job::validate_title(&input.title)?;
    input.skills_matrix.validate()?;
    if let Some(range) = &input.salary_range {
        range.validate()?;
    }
    Ok(())
}

fn validate_update(input: &UpdateJob) -> Result<(), CoreError> {
    if let Some(title) = &input.title {
        job::validate_title(title)?;
    }
    if let Some(matrix) = &input.skills_matrix {
        matrix.validate()?;
    }
    if let Some(range) = &input.salary_range {
        range.validate()?;
    }
    Ok(())
}

/// POST /api/v1/jobs
pub async fn create(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Json(input): Json<CreateJob>,
) -> AppResult<(StatusCode, Json<DataResponse<Job>>)> {
    validate_create(&input)?;

    let job = JobRepo::create(&state.pool, &input, user.db_id()).await?;
    tracing::info!(job_id = job.id, title = %job.title, user_id = user.user_id, "Job created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: job })))
}

/// GET /api/v1/jobs?status=
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<JobListParams>,
) -> AppResult<Json<DataResponse<Vec<Job>>>> {
    let status = parse_optional::<JobStatus>(params.status.as_deref())?;
    let jobs = JobRepo::list(&state.pool, status.map(JobStatus::as_str)).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /api/v1/jobs/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Job>>> {
    let job = find_job(&state, id).await?;
    Ok(Json(DataResponse { data: job }))
}

/// PUT /api/v1/jobs/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireRecruiter(_user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateJob>,
) -> AppResult<Json<DataResponse<Job>>> {
    validate_update(&input)?;

    let job = JobRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Job", id }))?;
    Ok(Json(DataResponse { data: job }))
}

/// PATCH /api/v1/jobs/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateJobStatus>,
) -> AppResult<Json<DataResponse<Job>>> {
    let existing = find_job(&state, id).await?;
    let from: JobStatus = existing.status.parse()?;
    job::validate_transition(from, input.status)?;

    let job = JobRepo::update_status(&state.pool, id, input.status.as_str())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Job", id }))?;

    tracing::info!(job_id = id, %from, to = %input.status, user_id = user.user_id, "Job status changed");
    Ok(Json(DataResponse { data: job }))
}

/// GET /api/v1/jobs/{id}/skill-match/{candidate_id}
pub async fn skill_match_for_candidate(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path((id, candidate_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<SkillMatch>>> {
    let job = find_job(&state, id).await?;
    let candidate = SourcedCandidateRepo::find_by_id(&state.pool, candidate_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "SourcedCandidate",
            id: candidate_id,
        }))?;

    let result = skill_match(&candidate.skills, &job.skills_matrix);
    Ok(Json(DataResponse { data: result }))
}

/// POST /api/v1/jd/{id}/approve-with-sourcing
///
/// Publishes a draft JD and pulls matching unassigned candidates onto it.
pub async fn approve_with_sourcing(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ApprovedJob>>> {
    let existing = find_job(&state, id).await?;
    if existing.status != JobStatus::Draft.as_str() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Only draft jobs can be approved (job is {})",
            existing.status
        ))));
    }

    // A concurrent approval wins; ours sees no draft row.
    let (job, mut sourced) =
        JobRepo::approve_with_sourcing(&state.pool, id, SOURCING_POOL_LIMIT)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Conflict("Job was approved concurrently".into()))
            })?;
    sourced.sort_by(|a, b| b.fit_score.cmp(&a.fit_score).then(a.id.cmp(&b.id)));

    tracing::info!(
        job_id = id,
        sourced = sourced.len(),
        user_id = user.user_id,
        "JD approved with sourcing"
    );
    Ok(Json(DataResponse {
        data: ApprovedJob { job, sourced },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use talentdesk_core::job::{SalaryRange, SkillRequirement, SkillsMatrix};

    fn create_input(title: &str) -> CreateJob {
        CreateJob {
            title: title.into(),
            department: None,
            location: None,
            job_type: None,
            remote_policy: None,
            description: None,
            skills_matrix: SkillsMatrix::default(),
            salary_range: None,
        }
    }

    #[test]
    fn create_requires_title() {
        assert!(validate_create(&create_input("  ")).is_err());
        assert!(validate_create(&create_input("Backend Engineer")).is_ok());
    }

    #[test]
    fn create_checks_matrix_and_salary() {
        let mut input = create_input("Backend Engineer");
        input.skills_matrix.required = vec![SkillRequirement::new("Rust"), SkillRequirement::new("rust")];
        assert!(validate_create(&input).is_err());

        let mut input = create_input("Backend Engineer");
        input.salary_range = Some(SalaryRange { min: 200, max: 100, currency: "USD".into() });
        assert!(validate_create(&input).is_err());
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(validate_update(&UpdateJob::default()).is_ok());
    }
}
