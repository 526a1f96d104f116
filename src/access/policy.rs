//! Row policy evaluation.
//!
//! The evaluator answers one question per call: may this context see (or
//! write) this row? It reads grants through [`GrantSource`] on every call and
//! never caches them, so a revoked grant stops matching immediately.
//!
//! Everything resolves to [`Decision::Deny`] unless every predicate holds.

use crate::access::context::SessionContext;
use crate::command::{RowCommand, TransactionAmendment};
use crate::error::{DenyReason, LedgerError};
use crate::primitives::{AccessGrant, Account, Transaction};
use crate::rights;
use crate::types::{AccountId, RightsMask, TenantId, UserId};

/// Read access to the grant table.
pub trait GrantSource {
    fn grant(&self, user: UserId, account: AccountId) -> Option<AccessGrant>;
}

impl GrantSource for std::collections::HashMap<(UserId, AccountId), AccessGrant> {
    fn grant(&self, user: UserId, account: AccountId) -> Option<AccessGrant> {
        self.get(&(user, account)).copied()
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[inline]
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts a denial into `LedgerError::AccessDenied`.
    pub fn into_result(self) -> Result<(), LedgerError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(LedgerError::AccessDenied(reason)),
        }
    }

    /// Evaluates `next` only if `self` allows.
    #[inline]
    fn and_then(self, next: impl FnOnce() -> Decision) -> Decision {
        match self {
            Decision::Allow => next(),
            deny => deny,
        }
    }
}

#[inline]
fn require(condition: bool, reason: DenyReason) -> Decision {
    if condition {
        Decision::Allow
    } else {
        Decision::Deny(reason)
    }
}

/// Evaluates row policies against a grant table.
#[derive(Debug, Clone, Copy)]
pub struct PolicyEvaluator<'a, G: GrantSource + ?Sized> {
    grants: &'a G,
}

impl<'a, G: GrantSource + ?Sized> PolicyEvaluator<'a, G> {
    pub fn new(grants: &'a G) -> Self {
        PolicyEvaluator { grants }
    }

    fn established(ctx: &SessionContext) -> Decision {
        require(ctx.is_established(), DenyReason::NoContext)
    }

    fn same_tenant(ctx: &SessionContext, tenant: TenantId) -> Decision {
        require(tenant == ctx.tenant, DenyReason::TenantMismatch)
    }

    /// Whether the acting user's grant on `account` covers `need`.
    fn grant_covers(&self, ctx: &SessionContext, account: AccountId, need: RightsMask) -> Decision {
        match self.grants.grant(ctx.user, account) {
            None => Decision::Deny(DenyReason::NoGrant),
            Some(grant) if rights::sufficient(grant.rights(), need) => Decision::Allow,
            Some(_) => Decision::Deny(DenyReason::ReadOnlyGrant),
        }
    }

    /// Account visible iff same tenant and a grant exists for `(ctx.user, account)`.
    pub fn account_visibility(&self, ctx: &SessionContext, account: &Account) -> Decision {
        let decision = Self::established(ctx)
            .and_then(|| Self::same_tenant(ctx, account.tenant))
            .and_then(|| self.grant_covers(ctx, account.id, rights::core::READ));
        tracing::trace!(account_id = %account.id, ?decision, "account visibility");
        decision
    }

    /// Transaction visible iff same tenant and a grant exists for
    /// `(ctx.user, transaction.account)`.
    pub fn transaction_visibility(&self, ctx: &SessionContext, txn: &Transaction) -> Decision {
        let decision = Self::established(ctx)
            .and_then(|| Self::same_tenant(ctx, txn.tenant))
            .and_then(|| self.grant_covers(ctx, txn.account, rights::core::READ));
        tracing::trace!(transaction_id = %txn.id, ?decision, "transaction visibility");
        decision
    }

    pub fn can_see_account(&self, ctx: &SessionContext, account: &Account) -> bool {
        self.account_visibility(ctx, account).is_allowed()
    }

    pub fn can_see_transaction(&self, ctx: &SessionContext, txn: &Transaction) -> bool {
        self.transaction_visibility(ctx, txn).is_allowed()
    }

    /// Insert permitted iff declared tenant and creator match the context and
    /// the acting user's grant on the account covers the command's rights.
    pub fn check_insert<C: RowCommand + ?Sized>(&self, ctx: &SessionContext, cmd: &C) -> Decision {
        Self::established(ctx)
            .and_then(|| Self::same_tenant(ctx, cmd.tenant()))
            .and_then(|| require(cmd.created_by() == ctx.user, DenyReason::CreatorMismatch))
            .and_then(|| self.grant_covers(ctx, cmd.account(), cmd.required_rights()))
    }

    /// Amend permitted iff the existing row is visible, the acting user created
    /// it, tenant and creator are unchanged, and the user holds a mutate grant
    /// on both the current and the target account.
    pub fn check_amend(
        &self,
        ctx: &SessionContext,
        existing: &Transaction,
        amendment: &TransactionAmendment,
    ) -> Decision {
        // A hidden row must look the same as a missing one.
        let visible = match self.transaction_visibility(ctx, existing) {
            Decision::Deny(DenyReason::NoContext) => Decision::Deny(DenyReason::NoContext),
            Decision::Deny(_) => Decision::Deny(DenyReason::NotVisible),
            Decision::Allow => Decision::Allow,
        };
        visible
            .and_then(|| require(existing.created_by == ctx.user, DenyReason::NotOriginalCreator))
            .and_then(|| {
                require(
                    amendment.tenant == existing.tenant
                        && amendment.created_by == existing.created_by,
                    DenyReason::OwnershipReassignment,
                )
            })
            .and_then(|| self.grant_covers(ctx, existing.account, amendment.required_rights()))
            .and_then(|| {
                if amendment.account == existing.account {
                    Decision::Allow
                } else {
                    self.grant_covers(ctx, amendment.account, amendment.required_rights())
                }
            })
    }

    /// Account rows are never mutable through row policy. Only an
    /// administrative context may create or change them.
    pub fn check_account_mutation(&self, ctx: &SessionContext) -> Decision {
        check_admin(ctx)
    }
}

/// Provisioning requests require an established administrative context.
pub fn check_admin(ctx: &SessionContext) -> Decision {
    require(ctx.is_established(), DenyReason::NoContext)
        .and_then(|| require(ctx.is_admin(), DenyReason::NotAdministrator))
}
