//! Bulk loading of seed data.
//!
//! A seed document describes tenants, users, accounts, grants and
//! transactions in JSON. Loading is all-or-nothing: the document is applied
//! to a copy of the state which replaces the live state only if every row was
//! accepted.

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::access::{check_admin, SessionContext};
use crate::audit::AuditAction;
use crate::error::LedgerError;
use crate::primitives::{AccessGrant, Account, Tenant, Transaction, User};
use crate::types::{AccountId, CurrencyCode, TenantId, TransactionId, TransactionKind, UserId};

use super::core::{log_write_outcome, Ledger};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedAccount {
    pub id: AccountId,
    pub tenant: TenantId,
    pub number: String,
    pub currency: CurrencyCode,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedTransaction {
    /// Optional explicit id; otherwise the next free id is assigned.
    #[serde(default)]
    pub id: Option<TransactionId>,
    pub tenant: TenantId,
    /// Account number, not id, as seed files are written by hand.
    pub account: String,
    pub occurred_at: DateTime<Utc>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub created_by: UserId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedData {
    pub tenants: Vec<Tenant>,
    pub users: Vec<User>,
    pub accounts: Vec<SeedAccount>,
    pub grants: Vec<AccessGrant>,
    pub transactions: Vec<SeedTransaction>,
}

impl SeedData {
    pub fn from_json_str(raw: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(raw).map_err(|e| LedgerError::Seed(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Seed(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }
}

/// Row counts applied by a seed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub tenants: usize,
    pub users: usize,
    pub accounts: usize,
    pub grants: usize,
    pub transactions: usize,
}

impl Ledger {
    /// Applies `seed` under an administrative context.
    ///
    /// Seed transactions are written by the bulk loader, so they bypass the
    /// per-user insert policy, but each still has to satisfy the referential
    /// constraints: matching tenants and a creator from the same tenant.
    pub fn load_seed(&self, ctx: &SessionContext, seed: &SeedData) -> Result<SeedSummary, LedgerError> {
        let _span = tracing::info_span!(
            "load_seed",
            operation_id = %ctx.operation_id,
            tenant_id = %ctx.tenant,
            user_id = %ctx.user
        )
        .entered();
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let result = check_admin(ctx).into_result().and_then(|()| {
            let mut staged = inner.state.clone();
            let summary = self.apply_seed(&mut staged, seed)?;
            inner.state = staged;
            Ok(summary)
        });
        log_write_outcome("load_seed", &result);
        inner.audit.record(ctx, AuditAction::LoadSeed, &result);
        if let Ok(summary) = &result {
            tracing::info!(?summary, "seed applied");
        }
        result
    }

    fn apply_seed(
        &self,
        state: &mut super::state::LedgerState,
        seed: &SeedData,
    ) -> Result<SeedSummary, LedgerError> {
        for tenant in &seed.tenants {
            state.insert_tenant(tenant.clone())?;
        }
        for user in &seed.users {
            state.insert_user(user.clone())?;
        }
        for account in &seed.accounts {
            self.config.check_currency(account.currency)?;
            state.insert_account(Account {
                id: account.id,
                tenant: account.tenant,
                number: account.number.clone(),
                currency: account.currency,
            })?;
        }
        for grant in &seed.grants {
            state.upsert_grant(*grant)?;
        }
        for row in &seed.transactions {
            self.config.check_amount(row.amount)?;
            let account = state
                .account_by_number(&row.account)
                .map(|a| a.id)
                .ok_or_else(|| {
                    LedgerError::ConstraintViolation(format!("Unknown account number {:?}", row.account))
                })?;
            let creator_tenant = state.user(row.created_by).map(|u| u.tenant);
            if creator_tenant.is_some_and(|t| t != row.tenant) {
                return Err(LedgerError::ConstraintViolation(format!(
                    "Creator {} does not belong to tenant {}",
                    row.created_by, row.tenant
                )));
            }
            let id = match row.id {
                Some(id) => id,
                None => state.next_transaction_id()?,
            };
            state.append_transaction(Transaction {
                id,
                tenant: row.tenant,
                account,
                occurred_at: row.occurred_at,
                kind: row.kind,
                amount: row.amount,
                created_by: row.created_by,
                version: 1,
            })?;
        }
        Ok(SeedSummary {
            tenants: seed.tenants.len(),
            users: seed.users.len(),
            accounts: seed.accounts.len(),
            grants: seed.grants.len(),
            transactions: seed.transactions.len(),
        })
    }
}
