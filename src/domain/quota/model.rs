use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanTier {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "starter")]
    Starter,
    #[serde(rename = "pro")]
    Pro,
}

impl PlanTier {
    /// Characters granted per quota period.
    pub fn quota(&self) -> i64 {
        match self {
            PlanTier::Free => 1_000_000,
            PlanTier::Starter => 5_000_000,
            PlanTier::Pro => 10_000_000,
        }
    }

    /// Quota period: daily for the free tier, monthly for paid tiers.
    pub fn period(&self) -> Duration {
        match self {
            PlanTier::Free => Duration::days(1),
            PlanTier::Starter | PlanTier::Pro => Duration::days(30),
        }
    }

    /// Dispatch priority, higher served first.
    pub fn priority(&self) -> i32 {
        match self {
            PlanTier::Free => 0,
            PlanTier::Starter => 1,
            PlanTier::Pro => 2,
        }
    }

    pub fn allows_voice_cloning(&self) -> bool {
        match self {
            PlanTier::Free => false,
            PlanTier::Starter | PlanTier::Pro => true,
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanTier::Free => write!(f, "free"),
            PlanTier::Starter => write!(f, "starter"),
            PlanTier::Pro => write!(f, "pro"),
        }
    }
}

/// Per-user character allowance.
///
/// Invariant: `0 <= remaining <= total`. `remaining` is only ever
/// decremented by a committed job's weighted cost, floored at zero.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuotaAccount {
    pub user_id: Uuid,
    pub plan_tier: PlanTier,
    pub remaining: i64,
    pub total: i64,
    pub reset_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuotaAccount {
    /// Fresh account with the tier's default allowance.
    pub fn new(user_id: Uuid, plan_tier: PlanTier, now: DateTime<Utc>) -> Self {
        let quota = plan_tier.quota();
        let reset_at = now + plan_tier.period();
        Self {
            user_id,
            plan_tier,
            remaining: quota,
            total: quota,
            reset_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Lazily reset the allowance if the period has elapsed.
    ///
    /// Returns true if a reset was applied. Calling again without time
    /// passing is a no-op, since `reset_at` moves a full period ahead.
    pub fn check_and_reset(&mut self, now: DateTime<Utc>) -> bool {
        if now < self.reset_at {
            return false;
        }
        let quota = self.plan_tier.quota();
        self.remaining = quota;
        self.total = quota;
        self.reset_at = now + self.plan_tier.period();
        self.updated_at = now;
        true
    }

    pub fn can_afford(&self, cost: i64) -> bool {
        self.remaining >= cost
    }

    /// Deduct a committed job's cost, floored at zero.
    pub fn debit(&mut self, cost: i64) {
        self.remaining = (self.remaining - cost).max(0);
    }
}
