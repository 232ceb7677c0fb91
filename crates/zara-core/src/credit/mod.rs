//! Daily generation credits.

mod ledger;
mod model;

pub use ledger::{Consumption, CreditLedger, SyncOutcome};
pub use model::{CreditConfig, CreditState, DEFAULT_DAILY_LIMIT};
