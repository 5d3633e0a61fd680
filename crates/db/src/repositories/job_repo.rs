//! Repository for the `jobs` table.

use sqlx::types::Json;
use sqlx::PgPool;
use talentdesk_core::skills::{ranking_weights, weighted_fit_score};
use talentdesk_core::types::DbId;

use crate::models::job::{CreateJob, Job, UpdateJob};
use crate::models::sourced_candidate::SourcedCandidate;
use crate::repositories::SourcedCandidateRepo;

const COLUMNS: &str = "id, title, department, location, job_type, remote_policy, description, \
                       skills_matrix, salary_range, status, created_by, approved_at, \
                       created_at, updated_at";

pub struct JobRepo;

impl JobRepo {
    /// Insert a draft job, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateJob,
        created_by: Option<DbId>,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (title, department, location, job_type, remote_policy,
                               description, skills_matrix, salary_range, created_by)
             VALUES ($1, $2, $3, COALESCE($4, 'full_time'), COALESCE($5, 'onsite'),
                     $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(input.title.trim())
            .bind(&input.department)
            .bind(&input.location)
            .bind(input.job_type.map(|t| t.as_str()))
            .bind(input.remote_policy.map(|p| p.as_str()))
            .bind(&input.description)
            .bind(Json(&input.skills_matrix))
            .bind(input.salary_range.as_ref().map(Json))
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List jobs, newest first, optionally filtered by status.
    pub async fn list(pool: &PgPool, status: Option<&str>) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Apply the non-`None` fields of `input`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateJob,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET
                title = COALESCE($2, title),
                department = COALESCE($3, department),
                location = COALESCE($4, location),
                job_type = COALESCE($5, job_type),
                remote_policy = COALESCE($6, remote_policy),
                description = COALESCE($7, description),
                skills_matrix = COALESCE($8, skills_matrix),
                salary_range = COALESCE($9, salary_range)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.department)
            .bind(&input.location)
            .bind(input.job_type.map(|t| t.as_str()))
            .bind(input.remote_policy.map(|p| p.as_str()))
            .bind(&input.description)
            .bind(input.skills_matrix.as_ref().map(Json))
            .bind(input.salary_range.as_ref().map(Json))
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("UPDATE jobs SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Publish a draft (set it active and stamp `approved_at`) and attach up
    /// to `pool_limit` unassigned candidates sharing any of its skills,
    /// scored against the approved matrix.
    ///
    /// One transaction: either the job is approved with its candidates or
    /// nothing changes. Returns `None` if the job is not a draft.
    pub async fn approve_with_sourcing(
        pool: &PgPool,
        id: DbId,
        pool_limit: i64,
    ) -> Result<Option<(Job, Vec<SourcedCandidate>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE jobs SET status = 'active', approved_at = NOW()
             WHERE id = $1 AND status = 'draft'
             RETURNING {COLUMNS}"
        );
        let Some(job) = sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let (skills, _) = ranking_weights(&job.skills_matrix);
        let mut sourced = Vec::new();
        if !skills.is_empty() {
            let candidates =
                SourcedCandidateRepo::lock_unassigned_with_skills(&mut tx, &skills, pool_limit)
                    .await?;
            for candidate in candidates {
                let fit = weighted_fit_score(&candidate.skills, &job.skills_matrix);
                if let Some(attached) =
                    SourcedCandidateRepo::attach_to_job(&mut tx, candidate.id, id, fit).await?
                {
                    sourced.push(attached);
                }
            }
        }

        tx.commit().await?;
        Ok(Some((job, sourced)))
    }
}
