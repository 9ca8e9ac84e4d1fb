use crate::domain::quota::{PlanTier, QuotaAccount};
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Durable store for per-user quota accounts.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fetch the account, creating a free-tier default on first sight.
    async fn find_or_create(&self, user_id: Uuid) -> AppResult<QuotaAccount>;

    /// Persist an account after a lazy reset.
    async fn save(&self, account: &QuotaAccount) -> AppResult<()>;

    /// Atomically deduct a committed cost, floored at zero.
    async fn debit(&self, user_id: Uuid, amount: i64) -> AppResult<()>;
}

pub struct PgAccountRepository {
    pool: Arc<DbPool>,
}

impl PgAccountRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_or_create(&self, user_id: Uuid) -> AppResult<QuotaAccount> {
        let pool = self.pool.as_ref();
        let default = QuotaAccount::new(user_id, PlanTier::Free, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO quota_accounts
                (user_id, plan_tier, remaining, total, reset_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(default.user_id)
        .bind(&default.plan_tier)
        .bind(default.remaining)
        .bind(default.total)
        .bind(default.reset_at)
        .bind(default.created_at)
        .bind(default.updated_at)
        .execute(pool)
        .await?;

        let account =
            sqlx::query_as::<_, QuotaAccount>("SELECT * FROM quota_accounts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(account)
    }

    async fn save(&self, account: &QuotaAccount) -> AppResult<()> {
        let pool = self.pool.as_ref();

        sqlx::query(
            r#"
            UPDATE quota_accounts
            SET plan_tier = $2, remaining = $3, total = $4, reset_at = $5, updated_at = $6
            WHERE user_id = $1
            "#,
        )
        .bind(account.user_id)
        .bind(&account.plan_tier)
        .bind(account.remaining)
        .bind(account.total)
        .bind(account.reset_at)
        .bind(account.updated_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn debit(&self, user_id: Uuid, amount: i64) -> AppResult<()> {
        let pool = self.pool.as_ref();

        // GREATEST keeps the balance non-negative even if a reset and a
        // commit interleave badly.
        sqlx::query(
            r#"
            UPDATE quota_accounts
            SET remaining = GREATEST(0, remaining - $2), updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(())
    }
}
