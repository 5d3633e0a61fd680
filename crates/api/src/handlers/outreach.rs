//! Delivery callbacks from the outreach service.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use talentdesk_core::error::CoreError;
use talentdesk_core::outreach::{should_apply, MessageStatus};
use talentdesk_core::types::{DbId, Timestamp};
use talentdesk_db::repositories::{CampaignRepo, OutreachMessageRepo, SourcedCandidateRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /outreach/events`.
#[derive(Debug, Deserialize)]
pub struct DeliveryEvent {
    /// The outreach service's id, as returned on dispatch.
    pub message_id: String,
    pub status: MessageStatus,
    pub occurred_at: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct EventOutcome {
    pub applied: bool,
    /// The message's status after the event, when the message is known.
    pub status: Option<MessageStatus>,
    pub campaign_id: Option<DbId>,
}

/// Check the shared callback key when one is configured.
fn verify_callback(state: &AppState, headers: &HeaderMap) -> AppResult<()> {
    let Some(expected) = state.config.outreach_callback_key.as_deref() else {
        return Ok(());
    };
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if !key_matches(presented, expected) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid outreach callback credentials".into(),
        )));
    }
    Ok(())
}

/// Compares SHA-256 digests in constant time, so neither the key's
/// contents nor its length leak through response timing.
fn key_matches(presented: Option<&str>, expected: &str) -> bool {
    let Some(presented) = presented else {
        return false;
    };
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented.as_slice().ct_eq(expected.as_slice()).into()
}

/// POST /api/v1/outreach/events
///
/// Unknown message ids are acknowledged without effect so the service does
/// not retry them forever. Stale or out-of-order events are ignored.
pub async fn record_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<DeliveryEvent>,
) -> AppResult<Json<DataResponse<EventOutcome>>> {
    verify_callback(&state, &headers)?;

    let Some(message) =
        OutreachMessageRepo::find_by_external_id(&state.pool, &event.message_id).await?
    else {
        tracing::debug!(external_id = %event.message_id, "Delivery event for unknown message");
        return Ok(Json(DataResponse {
            data: EventOutcome {
                applied: false,
                status: None,
                campaign_id: None,
            },
        }));
    };

    let current: MessageStatus = message.status.parse()?;
    if !should_apply(current, event.status) {
        tracing::debug!(
            message_id = message.id,
            %current,
            incoming = %event.status,
            "Delivery event ignored"
        );
        return Ok(Json(DataResponse {
            data: EventOutcome {
                applied: false,
                status: Some(current),
                campaign_id: Some(message.campaign_id),
            },
        }));
    }

    let occurred_at = event.occurred_at.unwrap_or_else(Utc::now);
    OutreachMessageRepo::apply_event(&state.pool, message.id, event.status, occurred_at).await?;

    if event.status == MessageStatus::Replied {
        SourcedCandidateRepo::mark_replied(&state.pool, message.sourced_candidate_id).await?;
    }
    CampaignRepo::refresh_counters(&state.pool, message.campaign_id).await?;

    tracing::info!(
        message_id = message.id,
        campaign_id = message.campaign_id,
        from = %current,
        to = %event.status,
        "Delivery event applied"
    );
    Ok(Json(DataResponse {
        data: EventOutcome {
            applied: true,
            status: Some(event.status),
            campaign_id: Some(message.campaign_id),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_key_must_match_exactly() {
        assert!(key_matches(Some("callback-key"), "callback-key"));
        assert!(!key_matches(Some("callback-ke"), "callback-key"));
        assert!(!key_matches(Some("callback-key "), "callback-key"));
        assert!(!key_matches(Some(""), "callback-key"));
        assert!(!key_matches(None, "callback-key"));
    }
}
