//! Handlers for `/emails`: one-off messages sent through the outreach
//! service and the log of everything sent.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use talentdesk_core::email::{validate_email_address, validate_subject};
use talentdesk_core::types::DbId;
use talentdesk_db::models::email_log::{EmailLog, SendEmail};
use talentdesk_db::repositories::EmailLogRepo;
use talentdesk_outreach::OutboundMessage;

use super::require_text;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequireRecruiter};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EmailLogParams {
    pub related_entity: Option<String>,
    pub related_id: Option<DbId>,
}

/// POST /api/v1/emails/send
///
/// The log row is written before dispatch so a failed send is still
/// recorded, with its error.
pub async fn send(
    State(state): State<AppState>,
    RequireRecruiter(user): RequireRecruiter,
    Json(input): Json<SendEmail>,
) -> AppResult<(StatusCode, Json<DataResponse<EmailLog>>)> {
    let input = SendEmail {
        to: input.to.trim().to_string(),
        subject: input.subject.trim().to_string(),
        related_entity: input
            .related_entity
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty()),
        ..input
    };
    validate_email_address(&input.to)?;
    validate_subject(&input.subject)?;
    require_text("body", &input.body)?;

    let log = EmailLogRepo::create_queued(&state.pool, &input, user.db_id()).await?;

    let outbound = OutboundMessage {
        message_id: format!("email-{}", log.id),
        to: log.recipient.clone(),
        subject: Some(log.subject.clone()),
        body: log.body.clone(),
        channel: "email".to_string(),
        metadata: json!({
            "email_log_id": log.id,
            "related_entity": log.related_entity,
            "related_id": log.related_id,
        }),
    };

    let receipt = match state.outreach.dispatch(&outbound).await {
        Ok(receipt) => receipt,
        Err(e) => {
            EmailLogRepo::mark_failed(&state.pool, log.id, &e.to_string()).await?;
            tracing::warn!(email_log_id = log.id, error = %e, "Email dispatch failed");
            return Err(AppError::Outreach(e));
        }
    };

    let sent = EmailLogRepo::mark_sent(&state.pool, log.id, &receipt.external_id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Email log {} vanished", log.id)))?;

    tracing::info!(email_log_id = sent.id, external_id = %receipt.external_id, user_id = user.user_id, "Email sent");
    Ok((StatusCode::CREATED, Json(DataResponse { data: sent })))
}

/// GET /api/v1/emails?related_entity=&related_id=
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(params): Query<EmailLogParams>,
) -> AppResult<Json<DataResponse<Vec<EmailLog>>>> {
    let entity = params
        .related_entity
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase);
    let logs = EmailLogRepo::list(&state.pool, entity.as_deref(), params.related_id).await?;
    Ok(Json(DataResponse { data: logs }))
}
