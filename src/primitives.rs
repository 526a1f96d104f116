use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::rights;
use crate::types::{AccountId, CurrencyCode, RightsMask, TenantId, TransactionId, TransactionKind, UserId};

// --- Tenants & identities ---------------------------------------------------

/// An isolated customer / organisation boundary. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
}

/// An application user. Belongs to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,        // Unique across the registry
    pub display_name: String,
    pub tenant: TenantId,
}

// --- Resources --------------------------------------------------------------

/// An account scoped to one tenant. Mutated only by administrators.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub tenant: TenantId,
    pub number: String, // Unique, e.g. "ACC-ACME-001"
    pub currency: CurrencyCode,
}

/// Links one user to one account. Identity is `(user, account)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccessGrant {
    pub user: UserId,
    pub account: AccountId,
    pub can_mutate: bool,
}

impl AccessGrant {
    /// Rights conferred by this grant, canonicalised.
    #[inline]
    pub fn rights(&self) -> RightsMask {
        rights::for_grant(self.can_mutate)
    }
}

// --- Ledger -----------------------------------------------------------------

/// A ledger entry on one account.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub tenant: TenantId,  // Always equal to the account's tenant
    pub account: AccountId,
    pub occurred_at: DateTime<Utc>,
    pub kind: TransactionKind,
    pub amount: Decimal,   // Signed; withdrawals and fees are negative
    pub created_by: UserId,
    pub version: u64,      // 1 on insert, +1 per amendment
}
