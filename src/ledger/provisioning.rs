//! Administrative provisioning of tenants, users, accounts and grants.
//!
//! Every call requires an established administrative context. Accounts can
//! only ever be created or changed through this module.

use crate::access::{check_admin, Decision, PolicyEvaluator, SessionContext};
use crate::audit::AuditAction;
use crate::error::LedgerError;
use crate::primitives::{AccessGrant, Account, Tenant, User};
use crate::types::{AccountId, CurrencyCode, TenantId, UserId};

use super::core::{log_write_outcome, Ledger};
use super::state::LedgerState;

impl Ledger {
    /// Runs one administrative write under the write lock and audits it.
    fn provision<T>(
        &self,
        ctx: &SessionContext,
        action: AuditAction,
        op: &'static str,
        f: impl FnOnce(&mut LedgerState) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        self.provision_gated(ctx, action, op, |_| check_admin(ctx), f)
    }

    /// Like `provision`, with `gate` deciding whether the write may proceed.
    fn provision_gated<T>(
        &self,
        ctx: &SessionContext,
        action: AuditAction,
        op: &'static str,
        gate: impl FnOnce(&LedgerState) -> Decision,
        f: impl FnOnce(&mut LedgerState) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let _span = tracing::info_span!(
            "provision",
            op,
            operation_id = %ctx.operation_id,
            tenant_id = %ctx.tenant,
            user_id = %ctx.user
        )
        .entered();
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let result = gate(&inner.state)
            .into_result()
            .and_then(|()| f(&mut inner.state));
        log_write_outcome(op, &result);
        inner.audit.record(ctx, action, &result);
        result
    }

    pub fn create_tenant(
        &self,
        ctx: &SessionContext,
        id: TenantId,
        name: &str,
    ) -> Result<Tenant, LedgerError> {
        let tenant = Tenant { id, name: name.to_string() };
        self.provision(ctx, AuditAction::CreateTenant, "create_tenant", |state| {
            state.insert_tenant(tenant.clone())?;
            Ok(tenant)
        })
    }

    pub fn create_user(
        &self,
        ctx: &SessionContext,
        id: UserId,
        login: &str,
        display_name: &str,
        tenant: TenantId,
    ) -> Result<User, LedgerError> {
        let user = User {
            id,
            login: login.to_string(),
            display_name: display_name.to_string(),
            tenant,
        };
        self.provision(ctx, AuditAction::CreateUser, "create_user", |state| {
            state.insert_user(user.clone())?;
            Ok(user)
        })
    }

    /// Creates an account. `currency` must be a three-letter upper-case code
    /// and, when an allow-list is configured, one of the allowed codes.
    pub fn create_account(
        &self,
        ctx: &SessionContext,
        id: AccountId,
        tenant: TenantId,
        number: &str,
        currency: &str,
    ) -> Result<Account, LedgerError> {
        let parsed = currency.parse::<CurrencyCode>();
        self.provision(ctx, AuditAction::CreateAccount, "create_account", |state| {
            let currency = parsed.map_err(LedgerError::ConstraintViolation)?;
            self.config.check_currency(currency)?;
            let account = Account { id, tenant, number: number.to_string(), currency };
            state.insert_account(account.clone())?;
            Ok(account)
        })
    }

    /// Changes an account's currency, the only mutable account attribute.
    pub fn update_account_currency(
        &self,
        ctx: &SessionContext,
        account: AccountId,
        currency: &str,
    ) -> Result<Account, LedgerError> {
        let parsed = currency.parse::<CurrencyCode>();
        let gate = |state: &LedgerState| PolicyEvaluator::new(state).check_account_mutation(ctx);
        self.provision_gated(ctx, AuditAction::UpdateAccount, "update_account", gate, |state| {
            let currency = parsed.map_err(LedgerError::ConstraintViolation)?;
            self.config.check_currency(currency)?;
            let row = state
                .account_mut(account)
                .ok_or_else(|| LedgerError::NotFound(format!("Account {}", account)))?;
            row.currency = currency;
            Ok(row.clone())
        })
    }

    /// Grants (or re-grants) a user access to an account. The user and the
    /// account must belong to the same tenant.
    pub fn grant_access(
        &self,
        ctx: &SessionContext,
        user: UserId,
        account: AccountId,
        can_mutate: bool,
    ) -> Result<AccessGrant, LedgerError> {
        let grant = AccessGrant { user, account, can_mutate };
        self.provision(ctx, AuditAction::GrantAccess, "grant_access", |state| {
            state.upsert_grant(grant)?;
            Ok(grant)
        })
    }

    /// Removes a grant. Returns whether one existed. Takes effect for the
    /// very next evaluation.
    pub fn revoke_access(
        &self,
        ctx: &SessionContext,
        user: UserId,
        account: AccountId,
    ) -> Result<bool, LedgerError> {
        self.provision(ctx, AuditAction::RevokeAccess, "revoke_access", |state| {
            Ok(state.remove_grant(user, account).is_some())
        })
    }

    /// Unfiltered list of a tenant's accounts.
    pub fn list_accounts_for_tenant(
        &self,
        ctx: &SessionContext,
        tenant: TenantId,
    ) -> Result<Vec<Account>, LedgerError> {
        check_admin(ctx).into_result()?;
        let inner = self.inner.read();
        if inner.state.tenant(tenant).is_none() {
            return Err(LedgerError::NotFound(format!("Tenant {}", tenant)));
        }
        Ok(inner.state.accounts_for_tenant(tenant).cloned().collect())
    }
}
