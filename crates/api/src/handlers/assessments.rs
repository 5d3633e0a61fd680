//! Handlers for the `/assessments` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use talentdesk_core::assessment::{self, AssessmentStatus};
use talentdesk_core::email::validate_email_address;
use talentdesk_core::error::CoreError;
use talentdesk_core::types::DbId;
use talentdesk_db::models::assessment::{
    Assessment, CreateAssessment, ReviewAssessment, UpdateAssessmentStatus,
};
use talentdesk_db::repositories::AssessmentRepo;

use super::jobs::find_job;
use super::require_text;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequireRecruiter};
use crate::query::JobStatusFilter;
use crate::response::DataResponse;
use crate::state::AppState;

async fn find_assessment(state: &AppState, id: DbId) -> AppResult<Assessment> {
    AssessmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Assessment", id }))
}

/// GET /api/v1/assessments?job_id=&status=
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(filter): Query<JobStatusFilter>,
) -> AppResult<Json<DataResponse<Vec<Assessment>>>> {
    let status = filter.parsed_status::<AssessmentStatus>()?;
    let assessments =
        AssessmentRepo::list(&state.pool, filter.job_id, status.map(AssessmentStatus::as_str))
            .await?;
    Ok(Json(DataResponse { data: assessments }))
}

/// POST /api/v1/assessments
pub async fn create(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Json(input): Json<CreateAssessment>,
) -> AppResult<(StatusCode, Json<DataResponse<Assessment>>)> {
    require_text("Candidate name", &input.candidate_name)?;
    validate_email_address(input.candidate_email.trim())?;
    if !input.questions.is_array() {
        return Err(AppError::Core(CoreError::Validation(
            "questions must be a JSON array".into(),
        )));
    }
    if let Some(job_id) = input.job_id {
        find_job(&state, job_id).await?;
    }

    let assessment = AssessmentRepo::create(&state.pool, &input).await?;
    tracing::info!(
        assessment_id = assessment.id,
        kind = %assessment.kind,
        user_id = user.user_id,
        "Assessment created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: assessment })))
}

/// GET /api/v1/assessments/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Assessment>>> {
    let assessment = find_assessment(&state, id).await?;
    Ok(Json(DataResponse { data: assessment }))
}

/// PATCH /api/v1/assessments/{id}/status
///
/// `reviewed` is only reachable through the review endpoint.
pub async fn update_status(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAssessmentStatus>,
) -> AppResult<Json<DataResponse<Assessment>>> {
    if input.status == AssessmentStatus::Reviewed {
        return Err(AppError::Core(CoreError::Validation(
            "Use the review endpoint to mark an assessment reviewed".into(),
        )));
    }

    let existing = find_assessment(&state, id).await?;
    let from: AssessmentStatus = existing.status.parse()?;
    assessment::validate_transition(from, input.status)?;

    let updated =
        AssessmentRepo::update_status(&state.pool, id, input.status.as_str(), input.responses.as_ref())
            .await?
            .ok_or(AppError::Core(CoreError::NotFound { entity: "Assessment", id }))?;

    tracing::info!(assessment_id = id, %from, to = %input.status, user_id = user.user_id, "Assessment status changed");
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/assessments/{id}/review
///
/// Only completed assessments can be reviewed. A missing recommendation is
/// derived from the score.
pub async fn review(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewAssessment>,
) -> AppResult<Json<DataResponse<Assessment>>> {
    let existing = find_assessment(&state, id).await?;
    let from: AssessmentStatus = existing.status.parse()?;
    assessment::validate_transition(from, AssessmentStatus::Reviewed)?;
    assessment::validate_score(input.score)?;

    let recommendation = input
        .recommendation
        .unwrap_or_else(|| assessment::recommendation_for_score(input.score));
    let notes = input
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let reviewed = AssessmentRepo::review(
        &state.pool,
        id,
        input.score,
        recommendation.as_str(),
        notes,
        user.db_id(),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound { entity: "Assessment", id }))?;

    tracing::info!(
        assessment_id = id,
        score = input.score,
        %recommendation,
        user_id = user.user_id,
        "Assessment reviewed"
    );
    Ok(Json(DataResponse { data: reviewed }))
}
