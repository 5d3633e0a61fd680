//! Repository for the `campaigns` table.

use sqlx::types::Json;
use sqlx::PgPool;
use talentdesk_core::sequence::SequenceStep;
use talentdesk_core::types::DbId;

use crate::models::campaign::{Campaign, CreateCampaign, UpdateCampaign};

const COLUMNS: &str = "id, name, job_id, description, sequence, status, total_recipients, \
                       messages_sent, messages_opened, messages_clicked, messages_replied, \
                       messages_bounced, created_by, created_at, updated_at";

pub struct CampaignRepo;

impl CampaignRepo {
    /// Insert a draft campaign. `input.sequence` must already be renumbered.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCampaign,
        created_by: Option<DbId>,
    ) -> Result<Campaign, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaigns (name, job_id, description, sequence, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(input.name.trim())
            .bind(input.job_id)
            .bind(&input.description)
            .bind(Json(&input.sequence))
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List campaigns, newest first, filtered by job and/or status.
    pub async fn list(
        pool: &PgPool,
        job_id: Option<DbId>,
        status: Option<&str>,
    ) -> Result<Vec<Campaign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM campaigns
             WHERE ($1::bigint IS NULL OR job_id = $1)
               AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(job_id)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Apply the non-`None` fields of `input`. A present `sequence` replaces
    /// the stored one wholesale.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCampaign,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!(
            "UPDATE campaigns SET
                name = COALESCE($2, name),
                job_id = COALESCE($3, job_id),
                description = COALESCE($4, description),
                sequence = COALESCE($5, sequence)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.job_id)
            .bind(&input.description)
            .bind(input.sequence.as_ref().map(Json))
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("UPDATE campaigns SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the step list.
    pub async fn set_sequence(
        pool: &PgPool,
        id: DbId,
        steps: &[SequenceStep],
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("UPDATE campaigns SET sequence = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(Json(steps))
            .fetch_optional(pool)
            .await
    }

    /// Count one more sent message without a full recount.
    pub async fn record_sent(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE campaigns SET messages_sent = messages_sent + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Recompute every counter from `outreach_messages`.
    ///
    /// Counts are derived from the timestamp columns, so a message that was
    /// opened and then replied to counts towards both.
    pub async fn refresh_counters(pool: &PgPool, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!(
            "UPDATE campaigns SET
                total_recipients = s.total,
                messages_sent = s.sent,
                messages_opened = s.opened,
                messages_clicked = s.clicked,
                messages_replied = s.replied,
                messages_bounced = s.bounced
             FROM (
                SELECT COUNT(DISTINCT sourced_candidate_id) AS total,
                       COUNT(*) FILTER (WHERE sent_at IS NOT NULL) AS sent,
                       COUNT(*) FILTER (WHERE opened_at IS NOT NULL) AS opened,
                       COUNT(*) FILTER (WHERE clicked_at IS NOT NULL) AS clicked,
                       COUNT(*) FILTER (WHERE replied_at IS NOT NULL) AS replied,
                       COUNT(*) FILTER (WHERE bounced_at IS NOT NULL) AS bounced
                FROM outreach_messages
                WHERE campaign_id = $1
             ) AS s
             WHERE campaigns.id = $1
             RETURNING {COLUMNS}"
        );
        let campaign = sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        if let Some(c) = &campaign {
            tracing::debug!(
                campaign_id = c.id,
                sent = c.messages_sent,
                replied = c.messages_replied,
                "Campaign counters refreshed"
            );
        }
        Ok(campaign)
    }
}
