//! The ledger service: visibility-filtered reads and policy-checked writes.
//!
//! All state lives behind one `RwLock`. Reads hold the read lock while they
//! filter; writes hold the write lock across constraint checks, policy
//! evaluation and the store mutation, so a grant cannot be revoked between
//! the check and the write.

use parking_lot::RwLock;

use crate::access::{ContextCarrier, PolicyEvaluator, SessionContext};
use crate::audit::{AuditAction, AuditLog, AuditRecord};
use crate::command::{NewTransaction, TransactionAmendment};
use crate::config::LedgerConfig;
use crate::error::{DenyReason, LedgerError};
use crate::primitives::{Account, Transaction};
use crate::types::TransactionId;

use super::state::LedgerState;

#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) state: LedgerState,
    pub(crate) audit: AuditLog,
}

/// Shared handle to the ledger. `Send + Sync`; wrap in an `Arc` to share.
#[derive(Debug)]
pub struct Ledger {
    pub(crate) config: LedgerConfig,
    pub(crate) inner: RwLock<Inner>,
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::new(LedgerConfig::default())
    }
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        let audit = AuditLog::with_capacity(config.audit_capacity);
        Ledger {
            config,
            inner: RwLock::new(Inner {
                state: LedgerState::default(),
                audit,
            }),
        }
    }

    /// Validates `config` before building the ledger.
    pub fn try_new(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// A fresh, unset context carrier using this ledger's role labels.
    /// Create one per operation.
    pub fn carrier(&self) -> ContextCarrier {
        ContextCarrier::with_labels(self.config.role_labels())
    }

    /// Accounts the context may see: same tenant and a grant for the user.
    pub fn list_visible_accounts(&self, ctx: &SessionContext) -> Vec<Account> {
        let _span = tracing::info_span!(
            "list_visible_accounts",
            operation_id = %ctx.operation_id,
            tenant_id = %ctx.tenant,
            user_id = %ctx.user
        )
        .entered();
        let inner = self.inner.read();
        let policy = PolicyEvaluator::new(&inner.state);
        let visible: Vec<Account> = inner
            .state
            .accounts_for_tenant(ctx.tenant)
            .filter(|a| policy.can_see_account(ctx, a))
            .cloned()
            .collect();
        tracing::debug!(count = visible.len(), "visible accounts");
        visible
    }

    /// Transactions the context may see: same tenant and a grant on the
    /// transaction's account. Ordered by id.
    pub fn list_visible_transactions(&self, ctx: &SessionContext) -> Vec<Transaction> {
        let _span = tracing::info_span!(
            "list_visible_transactions",
            operation_id = %ctx.operation_id,
            tenant_id = %ctx.tenant,
            user_id = %ctx.user
        )
        .entered();
        let inner = self.inner.read();
        let policy = PolicyEvaluator::new(&inner.state);
        let visible: Vec<Transaction> = inner
            .state
            .transactions()
            .filter(|t| policy.can_see_transaction(ctx, t))
            .cloned()
            .collect();
        tracing::debug!(count = visible.len(), "visible transactions");
        visible
    }

    /// Visible transactions on the account with the given number. Empty when
    /// the account is unknown or hidden.
    pub fn list_visible_transactions_for_account(
        &self,
        ctx: &SessionContext,
        account_number: &str,
    ) -> Vec<Transaction> {
        let _span = tracing::info_span!(
            "list_visible_transactions_for_account",
            operation_id = %ctx.operation_id,
            tenant_id = %ctx.tenant,
            user_id = %ctx.user,
            account_number
        )
        .entered();
        let inner = self.inner.read();
        let policy = PolicyEvaluator::new(&inner.state);
        match inner.state.account_by_number(account_number) {
            Some(account) if policy.can_see_account(ctx, account) => inner
                .state
                .transactions_for_account(account.id)
                .filter(|t| policy.can_see_transaction(ctx, t))
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }

    /// A single transaction if the context may see it.
    pub fn visible_transaction(&self, ctx: &SessionContext, id: TransactionId) -> Option<Transaction> {
        let _span = tracing::info_span!(
            "visible_transaction",
            operation_id = %ctx.operation_id,
            tenant_id = %ctx.tenant,
            user_id = %ctx.user,
            transaction_id = %id
        )
        .entered();
        let inner = self.inner.read();
        let policy = PolicyEvaluator::new(&inner.state);
        inner
            .state
            .transaction(id)
            .filter(|t| policy.can_see_transaction(ctx, t))
            .cloned()
    }

    /// Inserts a transaction on behalf of the context.
    ///
    /// Constraints (amount shape, referential integrity) are checked first,
    /// then the insert policy. The new row gets the next id and version 1.
    pub fn insert_transaction(
        &self,
        ctx: &SessionContext,
        new: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        let _span = tracing::info_span!(
            "insert_transaction",
            operation_id = %ctx.operation_id,
            tenant_id = %ctx.tenant,
            user_id = %ctx.user
        )
        .entered();
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let result = Self::insert_locked(&self.config, &mut inner.state, ctx, new);
        log_write_outcome("insert", &result);
        inner.audit.record(ctx, AuditAction::InsertTransaction, &result);
        result
    }

    fn insert_locked(
        config: &LedgerConfig,
        state: &mut LedgerState,
        ctx: &SessionContext,
        new: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        config.check_amount(new.amount)?;
        state.check_transaction_refs(new.tenant, new.account, new.created_by)?;
        PolicyEvaluator::new(&*state).check_insert(ctx, &new).into_result()?;

        let txn = Transaction {
            id: state.next_transaction_id()?,
            tenant: new.tenant,
            account: new.account,
            occurred_at: new.occurred_at,
            kind: new.kind,
            amount: new.amount,
            created_by: new.created_by,
            version: 1,
        };
        state.append_transaction(txn.clone())?;
        Ok(txn)
    }

    /// Amends a transaction on behalf of its original creator.
    ///
    /// The amount shape is checked first, then the amend policy against the
    /// stored row, then the referential constraints of the new values. A
    /// tenant or creator change is therefore always `OwnershipReassignment`.
    /// A missing row and a row the context cannot see both yield
    /// `AccessDenied(NotVisible)`.
    pub fn amend_transaction(
        &self,
        ctx: &SessionContext,
        id: TransactionId,
        amendment: TransactionAmendment,
    ) -> Result<Transaction, LedgerError> {
        let _span = tracing::info_span!(
            "amend_transaction",
            operation_id = %ctx.operation_id,
            tenant_id = %ctx.tenant,
            user_id = %ctx.user,
            transaction_id = %id
        )
        .entered();
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let result = Self::amend_locked(&self.config, &mut inner.state, ctx, id, amendment);
        log_write_outcome("amend", &result);
        inner.audit.record(ctx, AuditAction::AmendTransaction, &result);
        result
    }

    fn amend_locked(
        config: &LedgerConfig,
        state: &mut LedgerState,
        ctx: &SessionContext,
        id: TransactionId,
        amendment: TransactionAmendment,
    ) -> Result<Transaction, LedgerError> {
        config.check_amount(amendment.amount)?;

        let existing = match state.transaction(id) {
            Some(txn) => txn.clone(),
            None if ctx.is_established() => return Err(DenyReason::NotVisible.into()),
            None => return Err(DenyReason::NoContext.into()),
        };
        // Ownership is decided on the stored row, before the amended
        // references are resolved.
        PolicyEvaluator::new(&*state)
            .check_amend(ctx, &existing, &amendment)
            .into_result()?;
        state.check_transaction_refs(amendment.tenant, amendment.account, amendment.created_by)?;

        if let Some(expected) = amendment.expected_version {
            if expected != existing.version {
                return Err(LedgerError::ConstraintViolation(format!(
                    "Transaction {} is at version {}, amendment expected {}",
                    id, existing.version, expected
                )));
            }
        }

        let updated = Transaction {
            id,
            tenant: amendment.tenant,
            account: amendment.account,
            occurred_at: amendment.occurred_at,
            kind: amendment.kind,
            amount: amendment.amount,
            created_by: amendment.created_by,
            version: existing.version + 1,
        };
        state.replace_transaction(updated.clone())?;
        Ok(updated)
    }

    /// Audit records, oldest first. Administrative contexts only.
    pub fn audit_log(&self, ctx: &SessionContext) -> Result<Vec<AuditRecord>, LedgerError> {
        crate::access::check_admin(ctx).into_result()?;
        Ok(self.inner.read().audit.snapshot())
    }

    /// Runs `f` against a read-locked view of the raw state.
    ///
    /// No policy is applied. Intended for administrative tooling and tests.
    pub fn inspect<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        f(&self.inner.read().state)
    }
}

pub(crate) fn log_write_outcome<T>(op: &'static str, result: &Result<T, LedgerError>) {
    match result {
        Ok(_) => tracing::info!(op, "write committed"),
        Err(LedgerError::AccessDenied(reason)) => {
            tracing::warn!(op, reason = %reason, "write denied")
        }
        Err(err) => tracing::warn!(op, error = %err, "write rejected"),
    }
}
