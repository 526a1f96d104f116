//!
//! Error types for ledger operations.

use crate::types::{AccountId, TransactionId};

/// Why a write (or administrative request) was refused by policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The context was never set, or carries the sentinel identity.
    NoContext,
    /// The row's tenant differs from the context tenant.
    TenantMismatch,
    /// The declared creator differs from the acting user.
    CreatorMismatch,
    /// No grant links the acting user to the account.
    NoGrant,
    /// A grant exists but does not confer the mutate right.
    ReadOnlyGrant,
    /// The target row does not exist or the context cannot see it.
    NotVisible,
    /// Only the original creator may amend a transaction.
    NotOriginalCreator,
    /// An amendment tried to move a transaction to another tenant or owner.
    OwnershipReassignment,
    /// The operation is reserved to administrative actors.
    NotAdministrator,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenyReason::NoContext => "no_context",
            DenyReason::TenantMismatch => "tenant_mismatch",
            DenyReason::CreatorMismatch => "creator_mismatch",
            DenyReason::NoGrant => "no_grant",
            DenyReason::ReadOnlyGrant => "read_only_grant",
            DenyReason::NotVisible => "not_visible",
            DenyReason::NotOriginalCreator => "not_original_creator",
            DenyReason::OwnershipReassignment => "ownership_reassignment",
            DenyReason::NotAdministrator => "not_administrator",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during ledger operations.
///
/// None of these are transient: callers should not retry them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A write was rejected by the row policy.
    #[error("Access denied: {0}")]
    AccessDenied(DenyReason),
    /// Referential or value constraints failed before any policy check.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    /// `ContextCarrier::set` was called a second time for the same operation.
    #[error("Context already set for operation {0}")]
    ContextAlreadySet(uuid::Uuid),
    /// An administrative lookup named a row that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Seed data could not be parsed.
    #[error("Seed error: {0}")]
    Seed(String),
}

impl LedgerError {
    pub(crate) fn unknown_account(id: AccountId) -> Self {
        LedgerError::ConstraintViolation(format!("Unknown account {}", id))
    }

    pub(crate) fn unknown_transaction(id: TransactionId) -> Self {
        LedgerError::NotFound(format!("Transaction {}", id))
    }

    /// Whether this error is a policy denial.
    pub fn is_denied(&self) -> bool {
        matches!(self, LedgerError::AccessDenied(_))
    }
}

impl From<DenyReason> for LedgerError {
    fn from(reason: DenyReason) -> Self {
        LedgerError::AccessDenied(reason)
    }
}
