//! Repository for the `offers` table.

use sqlx::types::Json;
use sqlx::PgPool;
use talentdesk_core::offer::NegotiationNote;
use talentdesk_core::types::DbId;

use crate::models::offer::{CreateOffer, Offer, UpdateOffer};

const COLUMNS: &str = "id, job_id, candidate_name, candidate_email, position_title, base_salary, \
                       currency, bonus, equity, signing_bonus, benefits, start_date, expires_at, \
                       negotiation_notes, status, created_by, approved_by, approved_at, sent_at, \
                       responded_at, created_at, updated_at";

pub struct OfferRepo;

impl OfferRepo {
    /// Insert a draft offer.
    pub async fn create(
        pool: &PgPool,
        input: &CreateOffer,
        created_by: Option<DbId>,
    ) -> Result<Offer, sqlx::Error> {
        let query = format!(
            "INSERT INTO offers
                (job_id, candidate_name, candidate_email, position_title, base_salary, currency,
                 bonus, equity, signing_bonus, benefits, start_date, expires_at, created_by)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'USD'), $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(input.job_id)
            .bind(input.candidate_name.trim())
            .bind(input.candidate_email.trim())
            .bind(input.position_title.trim())
            .bind(input.base_salary)
            .bind(&input.currency)
            .bind(input.bonus)
            .bind(&input.equity)
            .bind(input.signing_bonus)
            .bind(&input.benefits)
            .bind(input.start_date)
            .bind(input.expires_at)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM offers WHERE id = $1");
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List offers, most recently updated first.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        job_id: Option<DbId>,
    ) -> Result<Vec<Offer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM offers
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::bigint IS NULL OR job_id = $2)
             ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(status)
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    /// Apply the fields present in `input`. Text fields are trimmed; the
    /// nullable terms are cleared by an explicit `null`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateOffer,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!(
            "UPDATE offers SET
                candidate_name = COALESCE($2, candidate_name),
                candidate_email = COALESCE($3, candidate_email),
                position_title = COALESCE($4, position_title),
                base_salary = COALESCE($5, base_salary),
                currency = COALESCE($6, currency),
                bonus = CASE WHEN $7 THEN $8 ELSE bonus END,
                equity = CASE WHEN $9 THEN $10 ELSE equity END,
                signing_bonus = CASE WHEN $11 THEN $12 ELSE signing_bonus END,
                benefits = COALESCE($13, benefits),
                start_date = CASE WHEN $14 THEN $15 ELSE start_date END,
                expires_at = CASE WHEN $16 THEN $17 ELSE expires_at END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .bind(input.candidate_name.as_deref().map(str::trim))
            .bind(input.candidate_email.as_deref().map(str::trim))
            .bind(input.position_title.as_deref().map(str::trim))
            .bind(input.base_salary)
            .bind(&input.currency)
            .bind(input.bonus.is_some())
            .bind(input.bonus.flatten())
            .bind(input.equity.is_some())
            .bind(input.equity.clone().flatten())
            .bind(input.signing_bonus.is_some())
            .bind(input.signing_bonus.flatten())
            .bind(&input.benefits)
            .bind(input.start_date.is_some())
            .bind(input.start_date.flatten())
            .bind(input.expires_at.is_some())
            .bind(input.expires_at.flatten())
            .fetch_optional(pool)
            .await
    }

    /// Set the status, appending `note` to the negotiation log if given.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        note: Option<&NegotiationNote>,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!(
            "UPDATE offers SET
                status = $2,
                negotiation_notes = negotiation_notes || COALESCE($3::jsonb, '[]'::jsonb)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .bind(status)
            .bind(note.map(|n| Json([n])))
            .fetch_optional(pool)
            .await
    }

    /// Record an approval by `approved_by`.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        approved_by: Option<DbId>,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!(
            "UPDATE offers SET status = 'approved', approved_by = $2, approved_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .bind(approved_by)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_sent(pool: &PgPool, id: DbId) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!(
            "UPDATE offers SET status = 'sent', sent_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Record a candidate response (accept, counter or reject), append
    /// `note` if given, and stamp `responded_at`.
    pub async fn record_response(
        pool: &PgPool,
        id: DbId,
        status: &str,
        note: Option<&NegotiationNote>,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!(
            "UPDATE offers SET
                status = $2,
                negotiation_notes = negotiation_notes || COALESCE($3::jsonb, '[]'::jsonb),
                responded_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .bind(status)
            .bind(note.map(|n| Json([n])))
            .fetch_optional(pool)
            .await
    }
}
