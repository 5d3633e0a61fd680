//! Repository for the `sourced_candidates` table.

use sqlx::PgPool;
use talentdesk_core::types::DbId;

use crate::models::sourced_candidate::{
    CandidateSearch, NewSourcedCandidate, SourcedCandidate, UpsertedCandidate,
};

const COLUMNS: &str = "id, job_id, first_name, last_name, email, headline, current_company, \
                       location, profile_url, source, skills, experience_years, fit_score, \
                       status, notes, created_at, updated_at";

/// Row has at least one of the skills bound at `$n` (lowercased `text[]`).
fn skill_overlap(n: u8) -> String {
    format!(
        "(cardinality(${n}::text[]) = 0
          OR EXISTS (SELECT 1 FROM unnest(skills) AS s(skill) WHERE lower(btrim(s.skill)) = ANY(${n})))"
    )
}

pub struct SourcedCandidateRepo;

impl SourcedCandidateRepo {
    /// Insert a candidate, or refresh the existing row for the same
    /// `(job_id, email)`. Blank incoming fields do not erase stored ones.
    pub async fn upsert(
        pool: &PgPool,
        input: &NewSourcedCandidate,
    ) -> Result<UpsertedCandidate, sqlx::Error> {
        let query = format!(
            "INSERT INTO sourced_candidates
                (job_id, first_name, last_name, email, headline, current_company, location,
                 profile_url, source, skills, experience_years, fit_score, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT ((COALESCE(job_id, 0)), (lower(email))) WHERE email IS NOT NULL
             DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                headline = COALESCE(EXCLUDED.headline, sourced_candidates.headline),
                current_company = COALESCE(EXCLUDED.current_company, sourced_candidates.current_company),
                location = COALESCE(EXCLUDED.location, sourced_candidates.location),
                profile_url = COALESCE(EXCLUDED.profile_url, sourced_candidates.profile_url),
                source = COALESCE(EXCLUDED.source, sourced_candidates.source),
                skills = CASE WHEN cardinality(EXCLUDED.skills) > 0
                              THEN EXCLUDED.skills ELSE sourced_candidates.skills END,
                experience_years = COALESCE(EXCLUDED.experience_years, sourced_candidates.experience_years),
                fit_score = COALESCE(EXCLUDED.fit_score, sourced_candidates.fit_score),
                notes = COALESCE(EXCLUDED.notes, sourced_candidates.notes)
             RETURNING {COLUMNS}, (xmax = 0) AS inserted"
        );
        sqlx::query_as::<_, UpsertedCandidate>(&query)
            .bind(input.job_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.headline)
            .bind(&input.current_company)
            .bind(&input.location)
            .bind(&input.profile_url)
            .bind(&input.source)
            .bind(&input.skills)
            .bind(input.experience_years)
            .bind(input.fit_score)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SourcedCandidate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sourced_candidates WHERE id = $1");
        sqlx::query_as::<_, SourcedCandidate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch the rows with the given IDs. Missing IDs are silently absent.
    pub async fn find_many(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<SourcedCandidate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sourced_candidates WHERE id = ANY($1) ORDER BY id"
        );
        sqlx::query_as::<_, SourcedCandidate>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// List candidates, best fit first, filtered by job and/or status.
    pub async fn list(
        pool: &PgPool,
        job_id: Option<DbId>,
        status: Option<&str>,
    ) -> Result<Vec<SourcedCandidate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sourced_candidates
             WHERE ($1::bigint IS NULL OR job_id = $1)
               AND ($2::text IS NULL OR status = $2)
             ORDER BY fit_score DESC NULLS LAST, created_at DESC"
        );
        sqlx::query_as::<_, SourcedCandidate>(&query)
            .bind(job_id)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Search the candidate pool, strongest skill overlap first.
    ///
    /// The limit applies after ordering by `filter.rank_skills`, so the
    /// rows returned are the best matches however low their stored score.
    pub async fn search(
        pool: &PgPool,
        filter: &CandidateSearch,
        limit: i64,
    ) -> Result<Vec<SourcedCandidate>, sqlx::Error> {
        let skills = skill_overlap(2);
        let query = format!(
            "SELECT {COLUMNS} FROM sourced_candidates
             WHERE ($1::text IS NULL
                    OR concat_ws(' ', first_name, last_name, headline, current_company) ILIKE $1)
               AND {skills}
               AND ($3::text IS NULL OR location ILIKE $3)
               AND ($4::bigint IS NULL OR job_id = $4 OR job_id IS NULL)
             ORDER BY (
                SELECT COALESCE(SUM(r.weight), 0)
                FROM unnest($6::text[], $7::int[]) AS r(skill, weight)
                WHERE EXISTS (
                    SELECT 1 FROM unnest(sourced_candidates.skills) AS s(skill)
                    WHERE lower(btrim(s.skill)) = r.skill
                )
             ) DESC,
             fit_score DESC NULLS LAST, created_at DESC
             LIMIT $5"
        );
        sqlx::query_as::<_, SourcedCandidate>(&query)
            .bind(&filter.keyword_pattern)
            .bind(&filter.skills)
            .bind(&filter.location_pattern)
            .bind(filter.job_id)
            .bind(limit)
            .bind(&filter.rank_skills)
            .bind(&filter.rank_weights)
            .fetch_all(pool)
            .await
    }

    /// Unassigned candidates with any of `skills`, newest first, locked
    /// for the rest of the transaction. Rows another transaction is
    /// attaching are skipped.
    pub async fn lock_unassigned_with_skills(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        skills: &[String],
        limit: i64,
    ) -> Result<Vec<SourcedCandidate>, sqlx::Error> {
        let overlap = skill_overlap(1);
        let query = format!(
            "SELECT {COLUMNS} FROM sourced_candidates
             WHERE job_id IS NULL AND {overlap}
             ORDER BY created_at DESC
             LIMIT $2
             FOR UPDATE SKIP LOCKED"
        );
        sqlx::query_as::<_, SourcedCandidate>(&query)
            .bind(skills)
            .bind(limit)
            .fetch_all(&mut **tx)
            .await
    }

    /// Attach an unassigned candidate to a job with its computed fit score.
    ///
    /// Returns `None` if the candidate was already attached elsewhere or the
    /// job already has someone with the same email.
    pub async fn attach_to_job(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        job_id: DbId,
        fit_score: i32,
    ) -> Result<Option<SourcedCandidate>, sqlx::Error> {
        let query = format!(
            "UPDATE sourced_candidates SET job_id = $2, fit_score = $3
             WHERE id = $1
               AND job_id IS NULL
               AND NOT EXISTS (
                   SELECT 1 FROM sourced_candidates other
                   WHERE other.job_id = $2
                     AND other.email IS NOT NULL
                     AND lower(other.email) = lower(sourced_candidates.email)
               )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SourcedCandidate>(&query)
            .bind(id)
            .bind(job_id)
            .bind(fit_score)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        notes: Option<&str>,
    ) -> Result<Option<SourcedCandidate>, sqlx::Error> {
        let query = format!(
            "UPDATE sourced_candidates SET status = $2, notes = COALESCE($3, notes)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SourcedCandidate>(&query)
            .bind(id)
            .bind(status)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    /// Move `new` candidates to `contacted`. Returns the number moved.
    pub async fn mark_contacted(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sourced_candidates SET status = 'contacted'
             WHERE id = ANY($1) AND status = 'new'",
        )
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Move a candidate who answered outreach to `replied`, unless a
    /// recruiter has already progressed them further.
    pub async fn mark_replied(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sourced_candidates SET status = 'replied'
             WHERE id = $1 AND status IN ('new', 'contacted')",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
