use super::model::QuotaAccount;
use crate::error::AppResult;
use crate::infrastructure::repositories::AccountRepository;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Authorizes and commits character spend against per-user accounts.
///
/// Reset is lazy: the allowance is refreshed whenever a load observes
/// that the period has elapsed, never on a timer. Deduction happens
/// exactly once per job, after its terminal transition.
pub struct QuotaLedger {
    accounts: Arc<dyn AccountRepository>,
}

impl QuotaLedger {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// Load a user's account, applying a lazy reset if one is due.
    ///
    /// Must be called before every authorization check.
    pub async fn load(&self, user_id: Uuid) -> AppResult<QuotaAccount> {
        let mut account = self.accounts.find_or_create(user_id).await?;

        if account.check_and_reset(Utc::now()) {
            self.accounts.save(&account).await?;
            tracing::info!(
                user_id = %user_id,
                plan_tier = %account.plan_tier,
                remaining = account.remaining,
                reset_at = %account.reset_at,
                "Quota allowance reset"
            );
        }

        Ok(account)
    }

    /// Deduct a terminal job's weighted cost, floored at zero.
    pub async fn commit(&self, user_id: Uuid, cost: i64) -> AppResult<()> {
        self.accounts.debit(user_id, cost).await?;
        tracing::info!(
            user_id = %user_id,
            characters = cost,
            "Quota committed"
        );
        Ok(())
    }
}
