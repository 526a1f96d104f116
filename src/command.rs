//! Write requests accepted by the ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::primitives::Transaction;
use crate::rights;
use crate::types::{AccountId, RightsMask, TenantId, TransactionKind, UserId};

/// Trait for write requests that target an account's rows.
/// Lets the policy evaluator stay generic over the concrete request.
pub trait RowCommand {
    /// Tenant the request declares for the written row.
    fn tenant(&self) -> TenantId;
    /// Account the written row belongs to.
    fn account(&self) -> AccountId;
    /// Creator the request declares for the written row.
    fn created_by(&self) -> UserId;
    /// Rights mask the acting user's grant must cover.
    fn required_rights(&self) -> RightsMask;
}

/// Request to insert a new transaction.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NewTransaction {
    pub tenant: TenantId,
    pub account: AccountId,
    pub occurred_at: DateTime<Utc>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub created_by: UserId,
}

impl RowCommand for NewTransaction {
    fn tenant(&self) -> TenantId {
        self.tenant
    }
    fn account(&self) -> AccountId {
        self.account
    }
    fn created_by(&self) -> UserId {
        self.created_by
    }
    fn required_rights(&self) -> RightsMask {
        rights::core::MUTATE
    }
}

/// Replacement values for an existing transaction.
///
/// Every field is the full new value. Build one from the current row with
/// [`TransactionAmendment::from_existing`] and change what needs changing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransactionAmendment {
    pub tenant: TenantId,
    pub account: AccountId,
    pub occurred_at: DateTime<Utc>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub created_by: UserId,
    /// If set, the amendment applies only while the row is at this version.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl TransactionAmendment {
    pub fn from_existing(txn: &Transaction) -> Self {
        TransactionAmendment {
            tenant: txn.tenant,
            account: txn.account,
            occurred_at: txn.occurred_at,
            kind: txn.kind,
            amount: txn.amount,
            created_by: txn.created_by,
            expected_version: Some(txn.version),
        }
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = at;
        self
    }

    pub fn account(mut self, account: AccountId) -> Self {
        self.account = account;
        self
    }
}

impl RowCommand for TransactionAmendment {
    fn tenant(&self) -> TenantId {
        self.tenant
    }
    fn account(&self) -> AccountId {
        self.account
    }
    fn created_by(&self) -> UserId {
        self.created_by
    }
    fn required_rights(&self) -> RightsMask {
        rights::core::MUTATE
    }
}
