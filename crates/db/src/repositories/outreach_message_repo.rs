//! Repository for the `outreach_messages` table.

use sqlx::PgPool;
use talentdesk_core::outreach::MessageStatus;
use talentdesk_core::types::{DbId, Timestamp};

use crate::models::outreach_message::{NewOutreachMessage, OutreachMessage};

const COLUMNS: &str = "id, campaign_id, sourced_candidate_id, step_number, channel, recipient, \
                       subject, body, status, scheduled_for, sent_at, opened_at, clicked_at, \
                       replied_at, bounced_at, external_id, error_message, created_at, updated_at";

/// Timestamp column stamped when a message reaches `status`.
fn timestamp_column(status: MessageStatus) -> Option<&'static str> {
    match status {
        MessageStatus::Sent => Some("sent_at"),
        MessageStatus::Opened => Some("opened_at"),
        MessageStatus::Clicked => Some("clicked_at"),
        MessageStatus::Replied => Some("replied_at"),
        MessageStatus::Bounced => Some("bounced_at"),
        MessageStatus::Pending
        | MessageStatus::Sending
        | MessageStatus::Delivered
        | MessageStatus::Failed => None,
    }
}

pub struct OutreachMessageRepo;

impl OutreachMessageRepo {
    /// Insert a pending message.
    ///
    /// Returns `None` when the recipient already has this step queued.
    pub async fn insert_pending(
        pool: &PgPool,
        input: &NewOutreachMessage,
    ) -> Result<Option<OutreachMessage>, sqlx::Error> {
        let query = format!(
            "INSERT INTO outreach_messages
                (campaign_id, sourced_candidate_id, step_number, channel, recipient,
                 subject, body, scheduled_for)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT ON CONSTRAINT uq_outreach_messages_recipient_step DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OutreachMessage>(&query)
            .bind(input.campaign_id)
            .bind(input.sourced_candidate_id)
            .bind(input.step_number)
            .bind(&input.channel)
            .bind(&input.recipient)
            .bind(&input.subject)
            .bind(&input.body)
            .bind(input.scheduled_for)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<OutreachMessage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM outreach_messages WHERE external_id = $1");
        sqlx::query_as::<_, OutreachMessage>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// All messages of a campaign in send order.
    pub async fn list_for_campaign(
        pool: &PgPool,
        campaign_id: DbId,
    ) -> Result<Vec<OutreachMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM outreach_messages
             WHERE campaign_id = $1
             ORDER BY scheduled_for, sourced_candidate_id, step_number"
        );
        sqlx::query_as::<_, OutreachMessage>(&query)
            .bind(campaign_id)
            .fetch_all(pool)
            .await
    }

    /// Claim up to `limit` due pending messages for one send batch,
    /// oldest first.
    ///
    /// Claimed rows move to `sending` in the same statement that selects
    /// them; `SKIP LOCKED` keeps concurrent batches on disjoint rows.
    pub async fn claim_due(
        pool: &PgPool,
        campaign_id: DbId,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<OutreachMessage>, sqlx::Error> {
        let query = format!(
            "UPDATE outreach_messages SET status = 'sending'
             WHERE id IN (
                SELECT id FROM outreach_messages
                WHERE campaign_id = $1 AND status = 'pending' AND scheduled_for <= $2
                ORDER BY scheduled_for, id
                LIMIT $3
                FOR UPDATE SKIP LOCKED
             )
             RETURNING {COLUMNS}"
        );
        let mut claimed = sqlx::query_as::<_, OutreachMessage>(&query)
            .bind(campaign_id)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await?;
        claimed.sort_by_key(|m| (m.scheduled_for, m.id));
        Ok(claimed)
    }

    /// Fail claims older than `stale_before`. Their batch died between
    /// claim and outcome, so whether the message went out is unknown and
    /// it is not retried.
    pub async fn fail_stale_claims(
        pool: &PgPool,
        campaign_id: DbId,
        stale_before: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE outreach_messages
             SET status = 'failed', error_message = 'Send interrupted; delivery state unknown'
             WHERE campaign_id = $1 AND status = 'sending' AND updated_at < $2",
        )
        .bind(campaign_id)
        .bind(stale_before)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Record a successful dispatch of a claimed message.
    ///
    /// Returns `None` if the message is not in `sending`.
    pub async fn mark_sent(
        pool: &PgPool,
        id: DbId,
        external_id: &str,
    ) -> Result<Option<OutreachMessage>, sqlx::Error> {
        let query = format!(
            "UPDATE outreach_messages SET
                status = 'sent', sent_at = NOW(), external_id = $2, error_message = NULL
             WHERE id = $1 AND status = 'sending'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OutreachMessage>(&query)
            .bind(id)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// Record a failed dispatch of a claimed message.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        error: &str,
    ) -> Result<Option<OutreachMessage>, sqlx::Error> {
        let query = format!(
            "UPDATE outreach_messages SET status = 'failed', error_message = $2
             WHERE id = $1 AND status = 'sending'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OutreachMessage>(&query)
            .bind(id)
            .bind(error)
            .fetch_optional(pool)
            .await
    }

    /// Record a delivery event. The matching timestamp column is only set
    /// if it is still empty.
    pub async fn apply_event(
        pool: &PgPool,
        id: DbId,
        status: MessageStatus,
        occurred_at: Timestamp,
    ) -> Result<Option<OutreachMessage>, sqlx::Error> {
        let column = timestamp_column(status);
        let stamp = column
            .map(|c| format!(", {c} = COALESCE({c}, $3)"))
            .unwrap_or_default();
        let query = format!(
            "UPDATE outreach_messages SET status = $2{stamp}
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let mut q = sqlx::query_as::<_, OutreachMessage>(&query)
            .bind(id)
            .bind(status.as_str());
        if column.is_some() {
            q = q.bind(occurred_at);
        }
        q.fetch_optional(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_states_have_timestamp_columns() {
        assert_eq!(timestamp_column(MessageStatus::Opened), Some("opened_at"));
        assert_eq!(timestamp_column(MessageStatus::Replied), Some("replied_at"));
        assert_eq!(timestamp_column(MessageStatus::Delivered), None);
        assert_eq!(timestamp_column(MessageStatus::Failed), None);
    }
}
