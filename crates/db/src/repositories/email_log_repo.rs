//! Repository for the `email_log` table.

use sqlx::PgPool;
use talentdesk_core::types::DbId;

use crate::models::email_log::{EmailLog, SendEmail};

const COLUMNS: &str = "id, recipient, subject, body, related_entity, related_id, status, \
                       external_id, error_message, sent_by, created_at, updated_at";

pub struct EmailLogRepo;

impl EmailLogRepo {
    /// Record an email as queued before it is handed to the gateway.
    pub async fn create_queued(
        pool: &PgPool,
        input: &SendEmail,
        sent_by: Option<DbId>,
    ) -> Result<EmailLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO email_log (recipient, subject, body, related_entity, related_id, sent_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailLog>(&query)
            .bind(input.to.trim())
            .bind(input.subject.trim())
            .bind(&input.body)
            .bind(&input.related_entity)
            .bind(input.related_id)
            .bind(sent_by)
            .fetch_one(pool)
            .await
    }

    pub async fn mark_sent(
        pool: &PgPool,
        id: DbId,
        external_id: &str,
    ) -> Result<Option<EmailLog>, sqlx::Error> {
        let query = format!(
            "UPDATE email_log SET status = 'sent', external_id = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailLog>(&query)
            .bind(id)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        error: &str,
    ) -> Result<Option<EmailLog>, sqlx::Error> {
        let query = format!(
            "UPDATE email_log SET status = 'failed', error_message = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailLog>(&query)
            .bind(id)
            .bind(error)
            .fetch_optional(pool)
            .await
    }

    /// Newest first, optionally narrowed to one related record.
    pub async fn list(
        pool: &PgPool,
        related_entity: Option<&str>,
        related_id: Option<DbId>,
    ) -> Result<Vec<EmailLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM email_log
             WHERE ($1::text IS NULL OR related_entity = $1)
               AND ($2::bigint IS NULL OR related_id = $2)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, EmailLog>(&query)
            .bind(related_entity)
            .bind(related_id)
            .fetch_all(pool)
            .await
    }
}
