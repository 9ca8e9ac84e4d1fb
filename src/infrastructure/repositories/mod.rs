pub mod account_repository;
pub mod job_repository;
pub mod usage_repository;

pub use account_repository::{AccountRepository, PgAccountRepository};
pub use job_repository::{JobRepository, PgJobRepository};
pub use usage_repository::{PgUsageRepository, UsageRepository, UsageTotals};
