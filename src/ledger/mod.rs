pub mod core;
pub mod provisioning;
pub mod seed;
pub mod state;


// Re-export the primary types so `crate::ledger::*` paths stay short.
pub use self::core::Ledger;
pub use seed::{SeedAccount, SeedData, SeedSummary, SeedTransaction};
pub use state::LedgerState;
