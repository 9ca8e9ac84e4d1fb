use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

/// Aggregated character spend over a window.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct UsageTotals {
    pub characters: i64,
    pub requests: i64,
}

/// Append-only audit log of characters charged per job.
///
/// One record per admitted job, written at admission time; records are
/// never updated or deleted by this subsystem.
#[async_trait]
pub trait UsageRepository: Send + Sync {
    async fn append(&self, user_id: Uuid, job_id: Uuid, characters: i64) -> AppResult<()>;

    async fn totals_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<UsageTotals>;
}

pub struct PgUsageRepository {
    pool: Arc<DbPool>,
}

impl PgUsageRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageRepository for PgUsageRepository {
    async fn append(&self, user_id: Uuid, job_id: Uuid, characters: i64) -> AppResult<()> {
        let pool = self.pool.as_ref();
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO usage_records (id, user_id, job_id, characters_charged, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(job_id)
        .bind(characters)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn totals_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<UsageTotals> {
        let pool = self.pool.as_ref();

        let totals = sqlx::query_as::<_, UsageTotals>(
            r#"
            SELECT COALESCE(SUM(characters_charged), 0)::BIGINT AS characters,
                   COUNT(*)::BIGINT AS requests
            FROM usage_records
            WHERE user_id = $1 AND recorded_at >= $2
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(pool)
        .await?;

        Ok(totals)
    }
}
