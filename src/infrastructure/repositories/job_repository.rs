use crate::domain::job::{Job, JobTransition, NewJob};
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Durable store for job records.
///
/// Implementations must enforce the lifecycle state machine on
/// `transition` (via `Job::with_transition`) and serialize concurrent
/// mutations of the same job so a double dispatch cannot produce two
/// terminal states.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job in `queued`.
    async fn create(&self, new_job: NewJob) -> AppResult<Job>;

    /// Ownership-scoped lookup; another owner's job reads as `None`.
    async fn find(&self, job_id: Uuid, owner_id: Uuid) -> AppResult<Option<Job>>;

    /// Unscoped lookup, for executors that own the job by dispatch.
    async fn find_any(&self, job_id: Uuid) -> AppResult<Option<Job>>;

    /// A user's jobs, newest first.
    async fn list_by_owner(&self, owner_id: Uuid, limit: i64, offset: i64)
        -> AppResult<Vec<Job>>;

    /// Apply a lifecycle transition and return the updated job.
    async fn transition(&self, job_id: Uuid, transition: JobTransition) -> AppResult<Job>;
}

pub struct PgJobRepository {
    pool: Arc<DbPool>,
}

impl PgJobRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(&self, new_job: NewJob) -> AppResult<Job> {
        let pool = self.pool.as_ref();
        let id = Uuid::new_v4();
        let now = Utc::now();

        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO tts_jobs
                (id, owner_id, text, voice_id, language, voice_age, prosody_preset,
                 speaker_reference, status, priority, weighted_cost, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'queued', $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_job.owner_id)
        .bind(&new_job.text)
        .bind(&new_job.voice_id)
        .bind(&new_job.language)
        .bind(new_job.voice_age)
        .bind(new_job.prosody_preset)
        .bind(&new_job.speaker_reference)
        .bind(new_job.priority)
        .bind(new_job.weighted_cost)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    async fn find(&self, job_id: Uuid, owner_id: Uuid) -> AppResult<Option<Job>> {
        let pool = self.pool.as_ref();
        let job = sqlx::query_as::<_, Job>("SELECT * FROM tts_jobs WHERE id = $1 AND owner_id = $2")
            .bind(job_id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await?;

        Ok(job)
    }

    async fn find_any(&self, job_id: Uuid) -> AppResult<Option<Job>> {
        let pool = self.pool.as_ref();
        let job = sqlx::query_as::<_, Job>("SELECT * FROM tts_jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(pool)
            .await?;

        Ok(job)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Job>> {
        let pool = self.pool.as_ref();
        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM tts_jobs
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }

    async fn transition(&self, job_id: Uuid, transition: JobTransition) -> AppResult<Job> {
        let pool = self.pool.as_ref();

        let current = self
            .find_any(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;

        // Validates the state machine and computes the new record
        let updated = current.with_transition(&transition, Utc::now())?;

        // The status guard in WHERE is the safety net against a
        // concurrent executor racing us between load and update.
        let persisted = sqlx::query_as::<_, Job>(
            r#"
            UPDATE tts_jobs
            SET status = $3,
                audio_url = $4,
                error_message = $5,
                started_at = $6,
                completed_at = $7
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(current.status)
        .bind(updated.status)
        .bind(&updated.audio_url)
        .bind(&updated.error_message)
        .bind(updated.started_at)
        .bind(updated.completed_at)
        .fetch_optional(pool)
        .await?;

        persisted.ok_or_else(|| {
            AppError::Conflict(format!("job {job_id} was concurrently modified"))
        })
    }
}
