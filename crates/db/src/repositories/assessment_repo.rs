//! Repository for the `assessments` table.

use sqlx::PgPool;
use talentdesk_core::types::DbId;

use crate::models::assessment::{Assessment, CreateAssessment};

const COLUMNS: &str = "id, job_id, candidate_name, candidate_email, kind, questions, responses, \
                       status, score, recommendation, reviewer_notes, reviewed_by, completed_at, \
                       reviewed_at, created_at, updated_at";

pub struct AssessmentRepo;

impl AssessmentRepo {
    pub async fn create(pool: &PgPool, input: &CreateAssessment) -> Result<Assessment, sqlx::Error> {
        let query = format!(
            "INSERT INTO assessments (job_id, candidate_name, candidate_email, kind, questions)
             VALUES ($1, $2, $3, COALESCE($4, 'questionnaire'), $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(input.job_id)
            .bind(input.candidate_name.trim())
            .bind(input.candidate_email.trim())
            .bind(input.kind.map(|k| k.as_str()))
            .bind(&input.questions)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assessments WHERE id = $1");
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        job_id: Option<DbId>,
        status: Option<&str>,
    ) -> Result<Vec<Assessment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assessments
             WHERE ($1::bigint IS NULL OR job_id = $1)
               AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(job_id)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Set the status. Reaching `completed` stamps `completed_at` once and
    /// stores `responses` when given.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        responses: Option<&serde_json::Value>,
    ) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!(
            "UPDATE assessments SET
                status = $2,
                responses = COALESCE($3, responses),
                completed_at = CASE WHEN $2 = 'completed'
                                    THEN COALESCE(completed_at, NOW())
                                    ELSE completed_at END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(status)
            .bind(responses)
            .fetch_optional(pool)
            .await
    }

    /// Store a review and mark the assessment reviewed.
    pub async fn review(
        pool: &PgPool,
        id: DbId,
        score: i32,
        recommendation: &str,
        notes: Option<&str>,
        reviewed_by: Option<DbId>,
    ) -> Result<Option<Assessment>, sqlx::Error> {
        let query = format!(
            "UPDATE assessments SET
                status = 'reviewed',
                score = $2,
                recommendation = $3,
                reviewer_notes = $4,
                reviewed_by = $5,
                reviewed_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(id)
            .bind(score)
            .bind(recommendation)
            .bind(notes)
            .bind(reviewed_by)
            .fetch_optional(pool)
            .await
    }
}
