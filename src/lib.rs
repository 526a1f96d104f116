#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! Ledgerguard-Core is a row-level access-control layer for a multi-tenant
//! account ledger.
//!
//! Every read and write is evaluated against an explicit, per-operation
//! [`access::SessionContext`]: a row is visible only inside its own tenant and
//! only to users holding a grant on its account, and a transaction can be
//! written only by a user holding a mutate grant. Anything that cannot be
//! proven allowed is denied.

// Module for shared identifier and enumeration types.
pub mod types;

// Module for the stored row types (Tenant, User, Account, AccessGrant, Transaction).
pub mod primitives;

// Re-export all row types for easier access at the crate root.
pub use primitives::*;

// Module for the grant rights algebra.
pub mod rights;

// Module for error types.
pub mod error;

// Module for configuration.
pub mod config;

// Module for the context carrier and the policy evaluator.
pub mod access;

// Module for write requests.
pub mod command;

// Module for the audit trail.
pub mod audit;

// Module for stores and the ledger service.
pub mod ledger;

#[cfg(feature = "telemetry")]
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use access::{ContextCarrier, Decision, PolicyEvaluator, SessionContext};
pub use command::{NewTransaction, TransactionAmendment};
pub use config::LedgerConfig;
pub use error::{DenyReason, LedgerError};
pub use ledger::{Ledger, SeedData};
