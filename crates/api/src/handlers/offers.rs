//! Handlers for the `/offers` resource.
//!
//! Every state change goes through [`offer::apply_action`], the same table
//! that drives the buttons shown by `GET /offers/{id}/actions`. Offers
//! waiting on the candidate are expired lazily whenever they are read.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use talentdesk_core::email::validate_email_address;
use talentdesk_core::error::CoreError;
use talentdesk_core::offer::{
    self, EmailPreview, NegotiationNote, OfferAction, OfferLetter, OfferStatus,
};
use talentdesk_core::types::DbId;
use talentdesk_db::models::email_log::SendEmail;
use talentdesk_db::models::offer::{CreateOffer, Offer, UpdateOffer};
use talentdesk_db::repositories::{EmailLogRepo, OfferRepo};
use talentdesk_outreach::OutboundMessage;

use super::jobs::find_job;
use super::require_text;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{authorize_offer_action, RequireAdmin, RequireAuth, RequireRecruiter};
use crate::query::parse_optional;
use crate::response::DataResponse;
use crate::state::AppState;

/// `related_entity` recorded in the email log for offer letters.
const EMAIL_ENTITY: &str = "offer";

#[derive(Debug, Deserialize)]
pub struct OfferListParams {
    pub status: Option<String>,
    pub job_id: Option<DbId>,
}

/// Optional free-text note sent with a candidate or recruiter action.
#[derive(Debug, Default, Deserialize)]
pub struct NoteBody {
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OfferActions {
    pub status: OfferStatus,
    pub actions: &'static [OfferAction],
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Offer", id })
}

/// Flip an outstanding offer past its deadline to `expired`.
async fn expire_if_due(state: &AppState, offer: Offer) -> AppResult<Offer> {
    let status: OfferStatus = offer.status.parse()?;
    if !offer::should_expire(status, offer.expires_at, Utc::now()) {
        return Ok(offer);
    }
    let id = offer.id;
    let expired = OfferRepo::set_status(&state.pool, id, OfferStatus::Expired.as_str(), None)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(offer_id = id, from = %status, "Offer expired");
    Ok(expired)
}

/// Load an offer with lazy expiry applied, plus its parsed status.
async fn load_offer(state: &AppState, id: DbId) -> AppResult<(Offer, OfferStatus)> {
    let offer = OfferRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let offer = expire_if_due(state, offer).await?;
    let status = offer.status.parse()?;
    Ok((offer, status))
}

fn validate_create(input: &CreateOffer, now: chrono::DateTime<Utc>) -> Result<(), CoreError> {
    require_text("Candidate name", &input.candidate_name)?;
    require_text("Position title", &input.position_title)?;
    validate_email_address(input.candidate_email.trim())?;
    offer::validate_compensation(input.base_salary, input.bonus, input.signing_bonus)?;
    if let Some(currency) = &input.currency {
        offer::validate_currency(currency)?;
    }
    if input.expires_at.is_some_and(|at| at <= now) {
        return Err(CoreError::Validation(
            "Offer expiry must be in the future".into(),
        ));
    }
    Ok(())
}

fn validate_update(existing: &Offer, input: &UpdateOffer) -> Result<(), CoreError> {
    if let Some(name) = &input.candidate_name {
        require_text("Candidate name", name)?;
    }
    if let Some(title) = &input.position_title {
        require_text("Position title", title)?;
    }
    if let Some(email) = &input.candidate_email {
        validate_email_address(email.trim())?;
    }
    if let Some(currency) = &input.currency {
        offer::validate_currency(currency)?;
    }
    if input.expires_at.flatten().is_some_and(|at| at <= Utc::now()) {
        return Err(CoreError::Validation(
            "Offer expiry must be in the future".into(),
        ));
    }
    offer::validate_compensation(
        input.base_salary.unwrap_or(existing.base_salary),
        input.bonus_after(existing.bonus),
        input.signing_bonus_after(existing.signing_bonus),
    )
}

/// Build the letter for `offer` using the configured company and signature.
fn render_letter(state: &AppState, offer: &Offer) -> EmailPreview {
    offer::render_offer_email(&OfferLetter {
        candidate_name: &offer.candidate_name,
        candidate_email: &offer.candidate_email,
        position_title: &offer.position_title,
        company: &state.config.company_name,
        sender_name: &state.config.sender_name,
        base_salary: offer.base_salary,
        currency: &offer.currency,
        bonus: offer.bonus,
        signing_bonus: offer.signing_bonus,
        equity: offer.equity.as_deref(),
        benefits: &offer.benefits,
        start_date: offer.start_date,
        expires_at: offer.expires_at,
    })
}

/// Apply a response to an offer, appending `note` to the negotiation log.
///
/// On a sent offer this records the candidate's answer. On an offer
/// pending approval only `Reject` is available, and it is the approver
/// turning the offer down.
async fn respond(
    state: &AppState,
    id: DbId,
    action: OfferAction,
    note: Option<&str>,
    user: &AuthUser,
) -> AppResult<Offer> {
    let (_, from) = load_offer(state, id).await?;
    authorize_offer_action(user, from, action)?;
    let to = offer::apply_action(from, action)?;

    let note = note
        .map(|n| NegotiationNote::new(n, &user.actor(), Utc::now()))
        .transpose()?;

    let updated = if from == OfferStatus::PendingApproval {
        OfferRepo::set_status(&state.pool, id, to.as_str(), note.as_ref()).await?
    } else {
        OfferRepo::record_response(&state.pool, id, to.as_str(), note.as_ref()).await?
    };
    let updated = updated.ok_or_else(|| not_found(id))?;

    tracing::info!(offer_id = id, %from, %to, %action, user_id = user.user_id, role = %user.role, "Offer status changed");
    Ok(updated)
}

fn non_blank(note: Option<&String>) -> Option<&str> {
    note.map(|n| n.as_str()).filter(|n| !n.trim().is_empty())
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/offers?status=&job_id=
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<OfferListParams>,
) -> AppResult<Json<DataResponse<Vec<Offer>>>> {
    let status = parse_optional::<OfferStatus>(params.status.as_deref())?;
    let offers =
        OfferRepo::list(&state.pool, status.map(OfferStatus::as_str), params.job_id).await?;

    let mut result = Vec::with_capacity(offers.len());
    for offer in offers {
        let offer = expire_if_due(&state, offer).await?;
        // Expiry may have moved it out of the requested status.
        if status.map_or(true, |s| offer.status == s.as_str()) {
            result.push(offer);
        }
    }
    Ok(Json(DataResponse { data: result }))
}

/// POST /api/v1/offers
pub async fn create(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Json(input): Json<CreateOffer>,
) -> AppResult<(StatusCode, Json<DataResponse<Offer>>)> {
    validate_create(&input, Utc::now())?;
    if let Some(job_id) = input.job_id {
        find_job(&state, job_id).await?;
    }

    let offer = OfferRepo::create(&state.pool, &input, user.db_id()).await?;
    tracing::info!(offer_id = offer.id, user_id = user.user_id, "Offer created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: offer })))
}

/// GET /api/v1/offers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let (offer, _) = load_offer(&state, id).await?;
    Ok(Json(DataResponse { data: offer }))
}

/// PUT /api/v1/offers/{id}
///
/// Compensation fields can only change while the offer is draft,
/// pending approval or under negotiation.
pub async fn update(
    State(state): State<AppState>,
    RequireRecruiter(_user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOffer>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let (existing, status) = load_offer(&state, id).await?;
    if status.is_terminal() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "A {status} offer cannot be edited"
        ))));
    }
    if input.changes_terms() && !status.terms_editable() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Terms of a {status} offer cannot be changed"
        ))));
    }
    validate_update(&existing, &input)?;

    let offer = OfferRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: offer }))
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// GET /api/v1/offers/{id}/actions
pub async fn actions(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OfferActions>>> {
    let (_, status) = load_offer(&state, id).await?;
    Ok(Json(DataResponse {
        data: OfferActions {
            status,
            actions: offer::available_actions(status),
        },
    }))
}

/// POST /api/v1/offers/{id}/submit
pub async fn submit(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let (_, from) = load_offer(&state, id).await?;
    authorize_offer_action(&user, from, OfferAction::SubmitForApproval)?;
    let to = offer::apply_action(from, OfferAction::SubmitForApproval)?;

    let offer = OfferRepo::set_status(&state.pool, id, to.as_str(), None)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(offer_id = id, %from, %to, user_id = user.user_id, "Offer submitted for approval");
    Ok(Json(DataResponse { data: offer }))
}

/// POST /api/v1/offers/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let (_, from) = load_offer(&state, id).await?;
    authorize_offer_action(&user, from, OfferAction::Approve)?;
    offer::apply_action(from, OfferAction::Approve)?;

    let offer = OfferRepo::approve(&state.pool, id, user.db_id())
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(offer_id = id, %from, user_id = user.user_id, "Offer approved");
    Ok(Json(DataResponse { data: offer }))
}

/// POST /api/v1/offers/{id}/accept
pub async fn accept(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let offer = respond(&state, id, OfferAction::Accept, None, &user).await?;
    Ok(Json(DataResponse { data: offer }))
}

/// POST /api/v1/offers/{id}/counter
///
/// A counter-offer must say what the candidate asked for.
pub async fn counter(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(body): Json<NoteBody>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let note = body.note.unwrap_or_default();
    let offer = respond(&state, id, OfferAction::Counter, Some(&note), &user).await?;
    Ok(Json(DataResponse { data: offer }))
}

/// POST /api/v1/offers/{id}/reject
///
/// Records the candidate declining, or, on an offer pending approval, the
/// approver turning it down. The latter needs the admin role.
pub async fn reject(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
    body: Option<Json<NoteBody>>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let offer = respond(&state, id, OfferAction::Reject, non_blank(body.note.as_ref()), &user).await?;
    Ok(Json(DataResponse { data: offer }))
}

/// POST /api/v1/offers/{id}/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
    body: Option<Json<NoteBody>>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let (_, from) = load_offer(&state, id).await?;
    authorize_offer_action(&user, from, OfferAction::Withdraw)?;
    let to = offer::apply_action(from, OfferAction::Withdraw)?;

    let note = non_blank(body.note.as_ref())
        .map(|n| NegotiationNote::new(n, &user.actor(), Utc::now()))
        .transpose()?;

    let offer = OfferRepo::set_status(&state.pool, id, to.as_str(), note.as_ref())
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(offer_id = id, %from, %to, user_id = user.user_id, "Offer withdrawn");
    Ok(Json(DataResponse { data: offer }))
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// GET /api/v1/offers/{id}/email-preview
pub async fn email_preview(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EmailPreview>>> {
    let (offer, _) = load_offer(&state, id).await?;
    Ok(Json(DataResponse {
        data: render_letter(&state, &offer),
    }))
}

/// POST /api/v1/offers/{id}/send
///
/// If the outreach service fails the offer stays approved and the call
/// returns 502; the attempt is kept in the email log as failed.
pub async fn send(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Offer>>> {
    let (existing, from) = load_offer(&state, id).await?;
    authorize_offer_action(&user, from, OfferAction::Send)?;
    offer::apply_action(from, OfferAction::Send)?;

    let preview = render_letter(&state, &existing);
    let log = EmailLogRepo::create_queued(
        &state.pool,
        &SendEmail {
            to: preview.to.clone(),
            subject: preview.subject.clone(),
            body: preview.body.clone(),
            related_entity: Some(EMAIL_ENTITY.to_string()),
            related_id: Some(id),
        },
        user.db_id(),
    )
    .await?;

    let outbound = OutboundMessage {
        message_id: format!("offer-{id}"),
        to: preview.to,
        subject: Some(preview.subject),
        body: preview.body,
        channel: "email".to_string(),
        metadata: json!({ "offer_id": id }),
    };

    let receipt = match state.outreach.dispatch(&outbound).await {
        Ok(receipt) => receipt,
        Err(e) => {
            EmailLogRepo::mark_failed(&state.pool, log.id, &e.to_string()).await?;
            return Err(AppError::Outreach(e));
        }
    };
    EmailLogRepo::mark_sent(&state.pool, log.id, &receipt.external_id).await?;

    let offer = OfferRepo::mark_sent(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(offer_id = id, external_id = %receipt.external_id, user_id = user.user_id, "Offer sent");
    Ok(Json(DataResponse { data: offer }))
}

/// POST /api/v1/offers/{id}/viewed
///
/// Called from the tracking link in the offer email, so it is public.
pub async fn viewed(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let (_, status) = load_offer(&state, id).await?;
    let next = offer::mark_viewed(status);
    if next != status {
        OfferRepo::set_status(&state.pool, id, next.as_str(), None).await?;
        tracing::info!(offer_id = id, "Offer viewed");
    }
    Ok(StatusCode::NO_CONTENT)
}
