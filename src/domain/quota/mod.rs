pub mod ledger;
pub mod model;

pub use ledger::QuotaLedger;
pub use model::{PlanTier, QuotaAccount};
