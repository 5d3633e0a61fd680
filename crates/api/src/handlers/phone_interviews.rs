//! Handlers for phone screens: recruiters create them, candidates use the
//! public token link.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Serialize;
use talentdesk_core::error::CoreError;
use talentdesk_core::phone_interview::{
    generate_token, is_expired, validate_token_format, InterviewStatus,
    DEFAULT_LINK_VALIDITY_DAYS,
};
use talentdesk_core::types::{DbId, Timestamp};
use talentdesk_db::models::phone_interview::{
    CompletePhoneInterview, CreatePhoneInterview, PhoneInterview, PublicPhoneInterview,
};
use talentdesk_db::repositories::phone_interview_repo::NewPhoneInterview;
use talentdesk_db::repositories::PhoneInterviewRepo;

use super::jobs::find_job;
use super::require_text;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireRecruiter;
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest link lifetime a recruiter may request.
const MAX_LINK_VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Serialize)]
pub struct CreatedInterview {
    pub interview: PhoneInterview,
    /// Path of the candidate-facing page.
    pub link: String,
}

/// What a token lookup resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Open,
    /// Still marked open but past its expiry; persist the expiry.
    Lapsed,
    Closed,
    Completed,
}

fn link_state(interview: &PhoneInterview, now: Timestamp) -> LinkState {
    match interview.status.parse::<InterviewStatus>() {
        Ok(InterviewStatus::Completed) => LinkState::Completed,
        Ok(status) if status.is_open() => {
            if is_expired(interview.expires_at, now) {
                LinkState::Lapsed
            } else {
                LinkState::Open
            }
        }
        _ => LinkState::Closed,
    }
}

fn link_gone() -> AppError {
    AppError::Core(CoreError::Gone(
        "This interview link has expired".to_string(),
    ))
}

fn validity_days(requested: Option<i64>) -> Result<i64, CoreError> {
    let days = requested.unwrap_or(DEFAULT_LINK_VALIDITY_DAYS);
    if !(1..=MAX_LINK_VALIDITY_DAYS).contains(&days) {
        return Err(CoreError::Validation(format!(
            "valid_for_days must be between 1 and {MAX_LINK_VALIDITY_DAYS}"
        )));
    }
    Ok(days)
}

/// Resolve a token to an interview the candidate may still use.
///
/// Unknown and malformed tokens are both plain 404s so the response does
/// not reveal which tokens exist.
async fn open_interview(state: &AppState, token: &str) -> AppResult<PhoneInterview> {
    let unknown = || AppError::NotFound("Interview not found".to_string());
    validate_token_format(token).map_err(|_| unknown())?;
    let interview = PhoneInterviewRepo::find_by_token(&state.pool, token)
        .await?
        .ok_or_else(unknown)?;

    match link_state(&interview, Utc::now()) {
        LinkState::Open => Ok(interview),
        LinkState::Lapsed => {
            PhoneInterviewRepo::mark_expired(&state.pool, interview.id).await?;
            tracing::info!(interview_id = interview.id, "Phone interview link expired");
            Err(link_gone())
        }
        LinkState::Closed => Err(link_gone()),
        LinkState::Completed => Err(AppError::Core(CoreError::Conflict(
            "This interview has already been completed".to_string(),
        ))),
    }
}

/// POST /api/v1/phone-interviews
pub async fn create(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Json(input): Json<CreatePhoneInterview>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedInterview>>)> {
    require_text("candidate_name", &input.candidate_name)?;
    let days = validity_days(input.valid_for_days)?;
    if let Some(job_id) = input.job_id {
        find_job(&state, job_id).await?;
    }

    let questions: Vec<&str> = input
        .questions
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .collect();
    let questions = serde_json::json!(questions);

    let now = Utc::now();
    let starts = input.scheduled_at.map_or(now, |at| at.max(now));
    let token = generate_token();
    let phone = input
        .candidate_phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let interview = PhoneInterviewRepo::create(
        &state.pool,
        &NewPhoneInterview {
            job_id: input.job_id,
            candidate_name: input.candidate_name.trim(),
            candidate_phone: phone,
            token: &token,
            scheduled_at: input.scheduled_at,
            expires_at: starts + Duration::days(days),
            questions: &questions,
        },
    )
    .await?;

    tracing::info!(interview_id = interview.id, job_id = ?interview.job_id, user_id = user.user_id, "Phone interview created");
    let link = format!("/phone-interview/{}", interview.token);
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedInterview { interview, link },
        }),
    ))
}

/// An interview that can no longer change state.
fn closed_conflict(interview: &PhoneInterview) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Interview is {}",
        interview.status
    )))
}

/// POST /api/v1/phone-interviews/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PhoneInterview>>> {
    let existing = PhoneInterviewRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Phone interview {id} not found")))?;
    let cancelled = PhoneInterviewRepo::cancel(&state.pool, id)
        .await?
        .ok_or_else(|| closed_conflict(&existing))?;

    tracing::info!(interview_id = id, user_id = user.user_id, "Phone interview cancelled");
    Ok(Json(DataResponse { data: cancelled }))
}

/// GET /api/v1/phone-interview/{token}
pub async fn get_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<PublicPhoneInterview>>> {
    let interview = open_interview(&state, &token).await?;
    Ok(Json(DataResponse {
        data: interview.into(),
    }))
}

/// POST /api/v1/phone-interview/{token}/start
///
/// The candidate has begun answering. Starting twice is a no-op.
pub async fn start(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DataResponse<PublicPhoneInterview>>> {
    let interview = open_interview(&state, &token).await?;
    let interview = match PhoneInterviewRepo::start(&state.pool, interview.id).await? {
        Some(started) => {
            tracing::info!(interview_id = started.id, "Phone interview started");
            started
        }
        None => interview,
    };
    Ok(Json(DataResponse {
        data: interview.into(),
    }))
}

/// POST /api/v1/phone-interview/{token}/complete
pub async fn complete(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(input): Json<CompletePhoneInterview>,
) -> AppResult<Json<DataResponse<PublicPhoneInterview>>> {
    require_text("transcript", &input.transcript)?;
    let interview = open_interview(&state, &token).await?;

    let summary = input
        .summary
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let completed =
        PhoneInterviewRepo::complete(&state.pool, interview.id, input.transcript.trim(), summary)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Conflict(
                    "This interview is no longer open".to_string(),
                ))
            })?;

    tracing::info!(interview_id = completed.id, "Phone interview completed");
    Ok(Json(DataResponse {
        data: completed.into(),
    }))
}
