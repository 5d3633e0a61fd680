//! Repository for the `phone_interviews` table.

use sqlx::PgPool;
use talentdesk_core::types::{DbId, Timestamp};

use crate::models::phone_interview::PhoneInterview;

const COLUMNS: &str = "id, job_id, candidate_name, candidate_phone, token, status, scheduled_at, \
                       expires_at, questions, transcript, summary, completed_at, created_at, \
                       updated_at";

/// Values for a new interview. The token is generated by the caller.
#[derive(Debug, Clone)]
pub struct NewPhoneInterview<'a> {
    pub job_id: Option<DbId>,
    pub candidate_name: &'a str,
    pub candidate_phone: Option<&'a str>,
    pub token: &'a str,
    pub scheduled_at: Option<Timestamp>,
    pub expires_at: Timestamp,
    pub questions: &'a serde_json::Value,
}

pub struct PhoneInterviewRepo;

impl PhoneInterviewRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewPhoneInterview<'_>,
    ) -> Result<PhoneInterview, sqlx::Error> {
        let query = format!(
            "INSERT INTO phone_interviews
                (job_id, candidate_name, candidate_phone, token, scheduled_at, expires_at, questions)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PhoneInterview>(&query)
            .bind(input.job_id)
            .bind(input.candidate_name)
            .bind(input.candidate_phone)
            .bind(input.token)
            .bind(input.scheduled_at)
            .bind(input.expires_at)
            .bind(input.questions)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<PhoneInterview>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM phone_interviews WHERE token = $1");
        sqlx::query_as::<_, PhoneInterview>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PhoneInterview>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM phone_interviews WHERE id = $1");
        sqlx::query_as::<_, PhoneInterview>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// `scheduled` -> `in_progress`. Returns `None` if the interview was not
    /// waiting to start.
    pub async fn start(pool: &PgPool, id: DbId) -> Result<Option<PhoneInterview>, sqlx::Error> {
        let query = format!(
            "UPDATE phone_interviews SET status = 'in_progress'
             WHERE id = $1 AND status = 'scheduled'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PhoneInterview>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Close an open interview. Returns `None` if it was already closed.
    pub async fn cancel(pool: &PgPool, id: DbId) -> Result<Option<PhoneInterview>, sqlx::Error> {
        let query = format!(
            "UPDATE phone_interviews SET status = 'cancelled'
             WHERE id = $1 AND status IN ('scheduled', 'in_progress')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PhoneInterview>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Flip an open interview to `expired`. Returns `true` if it changed.
    pub async fn mark_expired(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE phone_interviews SET status = 'expired'
             WHERE id = $1 AND status IN ('scheduled', 'in_progress')",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store the transcript of an open interview. Returns `None` if the
    /// interview was completed, cancelled or expired in the meantime.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        transcript: &str,
        summary: Option<&str>,
    ) -> Result<Option<PhoneInterview>, sqlx::Error> {
        let query = format!(
            "UPDATE phone_interviews SET
                status = 'completed', transcript = $2, summary = $3, completed_at = NOW()
             WHERE id = $1 AND status IN ('scheduled', 'in_progress')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PhoneInterview>(&query)
            .bind(id)
            .bind(transcript)
            .bind(summary)
            .fetch_optional(pool)
            .await
    }
}
