//! Handlers for the `/campaigns` resource: CRUD, lifecycle, sequence
//! editing, recipient queueing, sending and analytics.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use talentdesk_core::campaign::{
    self, CampaignCounters, CampaignRates, CampaignStatus,
};
use talentdesk_core::error::CoreError;
use talentdesk_core::metrics::{daily_histogram, DailyMetrics, DEFAULT_WINDOW_DAYS};
use talentdesk_core::sequence::{self, Channel, SequenceStep, MAX_STEPS};
use talentdesk_core::template::{render, Personalization};
use talentdesk_core::types::DbId;
use talentdesk_db::models::campaign::{
    Campaign, CreateCampaign, UpdateCampaign, UpdateCampaignStatus,
};
use talentdesk_db::models::outreach_message::{NewOutreachMessage, OutreachMessage};
use talentdesk_db::models::sourced_candidate::SourcedCandidate;
use talentdesk_db::repositories::{
    CampaignRepo, JobRepo, OutreachMessageRepo, SourcedCandidateRepo,
};
use talentdesk_outreach::OutboundMessage;

use super::jobs::find_job;
use super::require_text;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequireRecruiter};
use crate::query::JobStatusFilter;
use crate::response::DataResponse;
use crate::state::AppState;

/// Most due messages claimed per send request.
const SEND_BATCH_SIZE: i64 = 50;

/// A `sending` claim older than this belongs to a batch that died.
/// Must exceed `SEND_BATCH_SIZE` times the gateway timeout.
const STALE_CLAIM_MINUTES: i64 = 15;

/// Longest analytics window.
const MAX_ANALYTICS_DAYS: u32 = 90;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StepPosition {
    /// 1-based insert position; appends when absent.
    pub position: Option<usize>,
}

/// Body of `POST /campaigns/{id}/steps/move`. Positions are 1-based.
#[derive(Debug, Deserialize)]
pub struct MoveStep {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddRecipients {
    pub candidate_ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct RecipientsAdded {
    /// Messages created.
    pub queued: usize,
    /// Messages not created: already queued, or no address for the channel.
    pub skipped: usize,
    /// Requested candidate IDs that do not exist.
    pub missing: Vec<DbId>,
    pub campaign: Campaign,
}

#[derive(Debug, Serialize)]
pub struct SendReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    pub campaign: Campaign,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CampaignAnalytics {
    pub campaign_id: DbId,
    pub counters: CampaignCounters,
    pub rates: CampaignRates,
    pub daily: Vec<DailyMetrics>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_campaign(state: &AppState, id: DbId) -> AppResult<Campaign> {
    CampaignRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Campaign", id }))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Campaign", id })
}

fn ensure_editable(campaign: &Campaign) -> AppResult<CampaignStatus> {
    let status: CampaignStatus = campaign.status.parse()?;
    if !campaign::sequence_editable(status) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "The sequence of a {status} campaign cannot be edited"
        ))));
    }
    Ok(status)
}

/// Renumber and, unless empty, validate a client-supplied sequence.
/// Drafts may be saved without steps.
fn prepare_sequence(steps: &mut [SequenceStep]) -> Result<(), CoreError> {
    sequence::renumber(steps);
    if steps.is_empty() {
        return Ok(());
    }
    sequence::validate_sequence(steps)
}

async fn save_sequence(
    state: &AppState,
    id: DbId,
    steps: &[SequenceStep],
) -> AppResult<Campaign> {
    CampaignRepo::set_sequence(&state.pool, id, steps)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Where a step for `candidate` should be delivered, if anywhere.
fn recipient_for(channel: Channel, candidate: &SourcedCandidate) -> Option<String> {
    let address = match channel {
        Channel::Email => candidate.email.as_deref(),
        Channel::Linkedin => candidate.profile_url.as_deref(),
        // Phone numbers are resolved by the outreach service.
        Channel::Sms => return None,
    };
    address
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

/// Build one pending message per step, chaining each step's schedule off
/// the previous one.
fn plan_messages(
    campaign_id: DbId,
    steps: &[SequenceStep],
    candidate: &SourcedCandidate,
    values: &Personalization,
    start: chrono::DateTime<Utc>,
) -> Vec<Option<NewOutreachMessage>> {
    let mut anchor = start;
    steps
        .iter()
        .map(|step| {
            let scheduled_for = sequence::next_send_time(anchor, step);
            anchor = scheduled_for;

            let recipient = recipient_for(step.channel, candidate);
            if step.channel != Channel::Sms && recipient.is_none() {
                return None;
            }
            Some(NewOutreachMessage {
                campaign_id,
                sourced_candidate_id: candidate.id,
                step_number: step.step_number,
                channel: step.channel.as_str().to_string(),
                recipient,
                subject: step.subject_line.as_deref().map(|s| render(s, values)),
                body: render(&step.message_body, values),
                scheduled_for,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/campaigns?job_id=&status=
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(filter): Query<JobStatusFilter>,
) -> AppResult<Json<DataResponse<Vec<Campaign>>>> {
    let status = filter.parsed_status::<CampaignStatus>()?;
    let campaigns =
        CampaignRepo::list(&state.pool, filter.job_id, status.map(CampaignStatus::as_str)).await?;
    Ok(Json(DataResponse { data: campaigns }))
}

/// POST /api/v1/campaigns
pub async fn create(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Json(mut input): Json<CreateCampaign>,
) -> AppResult<(StatusCode, Json<DataResponse<Campaign>>)> {
    require_text("Campaign name", &input.name)?;
    prepare_sequence(&mut input.sequence)?;
    if let Some(job_id) = input.job_id {
        find_job(&state, job_id).await?;
    }

    let campaign = CampaignRepo::create(&state.pool, &input, user.db_id()).await?;
    tracing::info!(
        campaign_id = campaign.id,
        steps = input.sequence.len(),
        user_id = user.user_id,
        "Campaign created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: campaign })))
}

/// GET /api/v1/campaigns/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let campaign = find_campaign(&state, id).await?;
    Ok(Json(DataResponse { data: campaign }))
}

/// PUT /api/v1/campaigns/{id}
///
/// A present `sequence` replaces the stored one and is only accepted while
/// the campaign is draft or paused.
pub async fn update(
    State(state): State<AppState>,
    RequireRecruiter(_user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateCampaign>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let existing = find_campaign(&state, id).await?;

    if let Some(name) = &input.name {
        require_text("Campaign name", name)?;
    }
    if let Some(steps) = input.sequence.as_mut() {
        ensure_editable(&existing)?;
        prepare_sequence(steps)?;
    }
    if let Some(job_id) = input.job_id {
        find_job(&state, job_id).await?;
    }

    let campaign = CampaignRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: campaign }))
}

/// PATCH /api/v1/campaigns/{id}/status
///
/// Activation requires a complete, valid sequence.
pub async fn update_status(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCampaignStatus>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let existing = find_campaign(&state, id).await?;
    let from: CampaignStatus = existing.status.parse()?;
    campaign::validate_transition(from, input.status)?;

    if input.status == CampaignStatus::Active {
        sequence::validate_sequence(&existing.sequence.0)?;
    }

    let campaign = CampaignRepo::update_status(&state.pool, id, input.status.as_str())
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(campaign_id = id, %from, to = %input.status, user_id = user.user_id, "Campaign status changed");
    Ok(Json(DataResponse { data: campaign }))
}

// ---------------------------------------------------------------------------
// Sequence editing
// ---------------------------------------------------------------------------

/// POST /api/v1/campaigns/{id}/steps?position=
pub async fn add_step(
    State(state): State<AppState>,
    RequireRecruiter(_user): RequireRecruiter,
    Path(id): Path<DbId>,
    Query(params): Query<StepPosition>,
    Json(step): Json<SequenceStep>,
) -> AppResult<(StatusCode, Json<DataResponse<Campaign>>)> {
    let existing = find_campaign(&state, id).await?;
    ensure_editable(&existing)?;

    let mut steps = existing.sequence.0;
    if steps.len() >= MAX_STEPS {
        return Err(AppError::Core(CoreError::Validation(format!(
            "A sequence may have at most {MAX_STEPS} steps"
        ))));
    }
    match params.position {
        Some(position) => sequence::insert_step(&mut steps, position.saturating_sub(1), step),
        None => sequence::add_step(&mut steps, step),
    }
    sequence::validate_sequence(&steps)?;

    let campaign = save_sequence(&state, id, &steps).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: campaign })))
}

/// DELETE /api/v1/campaigns/{id}/steps/{step_number}
pub async fn delete_step(
    State(state): State<AppState>,
    RequireRecruiter(_user): RequireRecruiter,
    Path((id, step_number)): Path<(DbId, i32)>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let existing = find_campaign(&state, id).await?;
    ensure_editable(&existing)?;

    let mut steps = existing.sequence.0;
    sequence::delete_step(&mut steps, step_number)?;

    let campaign = save_sequence(&state, id, &steps).await?;
    Ok(Json(DataResponse { data: campaign }))
}

/// POST /api/v1/campaigns/{id}/steps/move
pub async fn move_step(
    State(state): State<AppState>,
    RequireRecruiter(_user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(input): Json<MoveStep>,
) -> AppResult<Json<DataResponse<Campaign>>> {
    let existing = find_campaign(&state, id).await?;
    ensure_editable(&existing)?;

    let mut steps = existing.sequence.0;
    let len = steps.len();
    for (name, position) in [("from", input.from), ("to", input.to)] {
        if position == 0 || position > len {
            return Err(AppError::Core(CoreError::Validation(format!(
                "'{name}' must be between 1 and {len}"
            ))));
        }
    }
    sequence::move_step(&mut steps, input.from - 1, input.to - 1);

    let campaign = save_sequence(&state, id, &steps).await?;
    Ok(Json(DataResponse { data: campaign }))
}

// ---------------------------------------------------------------------------
// Recipients and sending
// ---------------------------------------------------------------------------

/// POST /api/v1/campaigns/{id}/recipients
///
/// Queues one pending message per (candidate, step). Re-adding a candidate
/// is harmless: existing (candidate, step) pairs are skipped.
pub async fn add_recipients(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
    Json(input): Json<AddRecipients>,
) -> AppResult<Json<DataResponse<RecipientsAdded>>> {
    let existing = find_campaign(&state, id).await?;
    let status: CampaignStatus = existing.status.parse()?;
    if status == CampaignStatus::Completed {
        return Err(AppError::Core(CoreError::Conflict(
            "Recipients cannot be added to a completed campaign".into(),
        )));
    }
    let steps = &existing.sequence.0;
    sequence::validate_sequence(steps)?;

    let mut ids = input.candidate_ids;
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "candidate_ids must not be empty".into(),
        )));
    }

    let job_title = match existing.job_id {
        Some(job_id) => JobRepo::find_by_id(&state.pool, job_id)
            .await?
            .map(|job| job.title)
            .unwrap_or_default(),
        None => String::new(),
    };

    let candidates = SourcedCandidateRepo::find_many(&state.pool, &ids).await?;
    let missing: Vec<DbId> = ids
        .iter()
        .copied()
        .filter(|id| !candidates.iter().any(|c| c.id == *id))
        .collect();

    let now = Utc::now();
    let (mut queued, mut skipped) = (0usize, 0usize);
    for candidate in &candidates {
        let values = Personalization {
            first_name: candidate.first_name.clone(),
            last_name: candidate.last_name.clone(),
            company: state.config.company_name.clone(),
            job_title: job_title.clone(),
            sender_name: state.config.sender_name.clone(),
        };
        for planned in plan_messages(id, steps, candidate, &values, now) {
            let Some(message) = planned else {
                skipped += 1;
                continue;
            };
            match OutreachMessageRepo::insert_pending(&state.pool, &message).await? {
                Some(_) => queued += 1,
                None => skipped += 1,
            }
        }
    }

    let campaign = CampaignRepo::refresh_counters(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(
        campaign_id = id,
        queued,
        skipped,
        missing = missing.len(),
        user_id = user.user_id,
        "Campaign recipients added"
    );
    Ok(Json(DataResponse {
        data: RecipientsAdded {
            queued,
            skipped,
            missing,
            campaign,
        },
    }))
}

/// POST /api/v1/campaigns/{id}/send
///
/// Claims and dispatches due pending messages. A delivery failure marks
/// that message failed and the batch carries on.
///
/// The batch runs on its own task: if the request times out or the client
/// goes away, the batch still finishes and records every outcome.
pub async fn send(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SendReport>>> {
    let existing = find_campaign(&state, id).await?;
    if existing.status != CampaignStatus::Active.as_str() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Only active campaigns can send (campaign is {})",
            existing.status
        ))));
    }

    let report = tokio::spawn(run_send_batch(state.clone(), id))
        .await
        .map_err(|e| AppError::InternalError(format!("Send batch aborted: {e}")))??;

    tracing::info!(
        campaign_id = id,
        attempted = report.attempted,
        sent = report.sent,
        failed = report.failed,
        user_id = user.user_id,
        "Campaign send finished"
    );
    Ok(Json(DataResponse { data: report }))
}

/// Claim one batch and record each message's outcome as soon as the
/// gateway answers.
async fn run_send_batch(state: AppState, id: DbId) -> AppResult<SendReport> {
    let now = Utc::now();
    let abandoned = OutreachMessageRepo::fail_stale_claims(
        &state.pool,
        id,
        now - Duration::minutes(STALE_CLAIM_MINUTES),
    )
    .await?;
    if abandoned > 0 {
        tracing::warn!(campaign_id = id, abandoned, "Failed outreach messages left in sending");
    }

    let claimed = OutreachMessageRepo::claim_due(&state.pool, id, now, SEND_BATCH_SIZE).await?;
    let attempted = claimed.len();
    let (mut sent, mut failed) = (0usize, 0usize);

    for message in claimed {
        match dispatch_message(&state, &message).await {
            Ok(external_id) => {
                if OutreachMessageRepo::mark_sent(&state.pool, message.id, &external_id)
                    .await?
                    .is_none()
                {
                    tracing::warn!(message_id = message.id, "Claim lost before send was recorded");
                    continue;
                }
                SourcedCandidateRepo::mark_contacted(&state.pool, &[message.sourced_candidate_id])
                    .await?;
                CampaignRepo::record_sent(&state.pool, id).await?;
                sent += 1;
            }
            Err(reason) => {
                tracing::warn!(
                    campaign_id = id,
                    message_id = message.id,
                    error = %reason,
                    "Outreach message failed"
                );
                OutreachMessageRepo::mark_failed(&state.pool, message.id, &reason).await?;
                failed += 1;
            }
        }
    }

    let campaign = CampaignRepo::refresh_counters(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(SendReport {
        attempted,
        sent,
        failed,
        campaign,
    })
}

/// Hand one message to the gateway, returning its external id or the
/// failure reason to store.
async fn dispatch_message(state: &AppState, message: &OutreachMessage) -> Result<String, String> {
    let channel: Channel = message.channel.parse().map_err(|e: CoreError| e.to_string())?;
    let to = match (&message.recipient, channel) {
        (Some(recipient), _) => recipient.clone(),
        (None, Channel::Sms) => String::new(),
        (None, _) => return Err("No recipient address".to_string()),
    };

    let outbound = OutboundMessage {
        message_id: format!("campaign-{}-message-{}", message.campaign_id, message.id),
        to,
        subject: message.subject.clone(),
        body: message.body.clone(),
        channel: message.channel.clone(),
        metadata: json!({
            "campaign_id": message.campaign_id,
            "candidate_id": message.sourced_candidate_id,
            "step_number": message.step_number,
        }),
    };

    state
        .outreach
        .dispatch(&outbound)
        .await
        .map(|receipt| receipt.external_id)
        .map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// GET /api/v1/campaigns/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<OutreachMessage>>>> {
    find_campaign(&state, id).await?;
    let messages = OutreachMessageRepo::list_for_campaign(&state.pool, id).await?;
    Ok(Json(DataResponse { data: messages }))
}

/// GET /api/v1/campaigns/{id}/analytics?days=
pub async fn analytics(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<DbId>,
    Query(params): Query<AnalyticsParams>,
) -> AppResult<Json<DataResponse<CampaignAnalytics>>> {
    let campaign = find_campaign(&state, id).await?;
    let messages = OutreachMessageRepo::list_for_campaign(&state.pool, id).await?;

    let days = params
        .days
        .unwrap_or(DEFAULT_WINDOW_DAYS)
        .clamp(1, MAX_ANALYTICS_DAYS);
    let activity: Vec<_> = messages.iter().map(OutreachMessage::activity).collect();
    let counters = campaign.counters();

    Ok(Json(DataResponse {
        data: CampaignAnalytics {
            campaign_id: id,
            counters,
            rates: counters.rates(),
            daily: daily_histogram(&activity, Utc::now().date_naive(), days),
        },
    }))
}
