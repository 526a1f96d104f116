//!
//! In-memory stores for tenants, users, accounts, grants and transactions.
//!
//! The stores are deliberately thin: exact-key lookups and foreign-key scans.
//! Each insert checks its own referential constraints and leaves the state
//! untouched when any of them fails. Policy is not evaluated here.

use std::collections::{BTreeMap, HashMap};

use crate::access::GrantSource;
use crate::error::LedgerError;
use crate::primitives::{AccessGrant, Account, Tenant, Transaction, User};
use crate::types::{AccountId, TenantId, TransactionId, UserId};

fn require_assignable(kind: &str, id: i64) -> Result<(), LedgerError> {
    if id > 0 {
        Ok(())
    } else {
        Err(LedgerError::ConstraintViolation(format!(
            "{} id must be positive, got {}",
            kind, id
        )))
    }
}

/// The authoritative ledger state.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    tenants: BTreeMap<TenantId, Tenant>,
    users: BTreeMap<UserId, User>,
    accounts: BTreeMap<AccountId, Account>,
    /// Keyed by the grant's composite identity.
    grants: HashMap<(UserId, AccountId), AccessGrant>,
    transactions: BTreeMap<TransactionId, Transaction>,
    last_transaction_id: i64,
}

impl GrantSource for LedgerState {
    fn grant(&self, user: UserId, account: AccountId) -> Option<AccessGrant> {
        self.grants.get(&(user, account)).copied()
    }
}

impl LedgerState {
    // --- Reads --------------------------------------------------------------

    pub fn tenant(&self, id: TenantId) -> Option<&Tenant> {
        self.tenants.get(&id)
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn user_by_login(&self, login: &str) -> Option<&User> {
        self.users.values().find(|u| u.login == login)
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn account_by_number(&self, number: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.number == number)
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    /// All accounts, ordered by id.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn accounts_for_tenant(&self, tenant: TenantId) -> impl Iterator<Item = &Account> {
        self.accounts.values().filter(move |a| a.tenant == tenant)
    }

    /// All transactions, ordered by id.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    pub fn transactions_for_account(&self, account: AccountId) -> impl Iterator<Item = &Transaction> {
        self.transactions.values().filter(move |t| t.account == account)
    }

    pub fn grants_for_user(&self, user: UserId) -> impl Iterator<Item = &AccessGrant> {
        self.grants.values().filter(move |g| g.user == user)
    }

    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    // --- Provisioning writes ------------------------------------------------

    pub(crate) fn insert_tenant(&mut self, tenant: Tenant) -> Result<(), LedgerError> {
        require_assignable("Tenant", tenant.id.0)?;
        if tenant.name.trim().is_empty() {
            return Err(LedgerError::ConstraintViolation("Tenant name must not be empty".into()));
        }
        if self.tenants.contains_key(&tenant.id) {
            return Err(LedgerError::ConstraintViolation(format!(
                "Tenant {} already exists",
                tenant.id
            )));
        }
        self.tenants.insert(tenant.id, tenant);
        Ok(())
    }

    pub(crate) fn insert_user(&mut self, user: User) -> Result<(), LedgerError> {
        require_assignable("User", user.id.0)?;
        if user.login.trim().is_empty() {
            return Err(LedgerError::ConstraintViolation("User login must not be empty".into()));
        }
        if !self.tenants.contains_key(&user.tenant) {
            return Err(LedgerError::ConstraintViolation(format!(
                "Unknown tenant {}",
                user.tenant
            )));
        }
        if self.users.contains_key(&user.id) {
            return Err(LedgerError::ConstraintViolation(format!("User {} already exists", user.id)));
        }
        if self.user_by_login(&user.login).is_some() {
            return Err(LedgerError::ConstraintViolation(format!(
                "Login {:?} is already taken",
                user.login
            )));
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    pub(crate) fn insert_account(&mut self, account: Account) -> Result<(), LedgerError> {
        require_assignable("Account", account.id.0)?;
        if account.number.trim().is_empty() {
            return Err(LedgerError::ConstraintViolation("Account number must not be empty".into()));
        }
        if !self.tenants.contains_key(&account.tenant) {
            return Err(LedgerError::ConstraintViolation(format!(
                "Unknown tenant {}",
                account.tenant
            )));
        }
        if self.accounts.contains_key(&account.id) {
            return Err(LedgerError::ConstraintViolation(format!(
                "Account {} already exists",
                account.id
            )));
        }
        if self.account_by_number(&account.number).is_some() {
            return Err(LedgerError::ConstraintViolation(format!(
                "Account number {:?} is already taken",
                account.number
            )));
        }
        self.accounts.insert(account.id, account);
        Ok(())
    }

    pub(crate) fn account_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.accounts.get_mut(&id)
    }

    /// Inserts or replaces the grant for `(grant.user, grant.account)`.
    /// Returns the previous grant, if any.
    pub(crate) fn upsert_grant(&mut self, grant: AccessGrant) -> Result<Option<AccessGrant>, LedgerError> {
        let user = self
            .users
            .get(&grant.user)
            .ok_or_else(|| LedgerError::ConstraintViolation(format!("Unknown user {}", grant.user)))?;
        let account = self
            .accounts
            .get(&grant.account)
            .ok_or_else(|| LedgerError::unknown_account(grant.account))?;
        if user.tenant != account.tenant {
            return Err(LedgerError::ConstraintViolation(format!(
                "User {} (tenant {}) cannot be granted account {} (tenant {})",
                user.id, user.tenant, account.id, account.tenant
            )));
        }
        Ok(self.grants.insert((grant.user, grant.account), grant))
    }

    pub(crate) fn remove_grant(&mut self, user: UserId, account: AccountId) -> Option<AccessGrant> {
        self.grants.remove(&(user, account))
    }

    // --- Ledger writes ------------------------------------------------------

    /// Referential constraints for a transaction row.
    ///
    /// The tenant must exist, the account must exist and belong to that
    /// tenant, and the creator must be a known user.
    pub(crate) fn check_transaction_refs(
        &self,
        tenant: TenantId,
        account: AccountId,
        created_by: UserId,
    ) -> Result<(), LedgerError> {
        if !self.tenants.contains_key(&tenant) {
            return Err(LedgerError::ConstraintViolation(format!("Unknown tenant {}", tenant)));
        }
        let acc = self
            .accounts
            .get(&account)
            .ok_or_else(|| LedgerError::unknown_account(account))?;
        if acc.tenant != tenant {
            return Err(LedgerError::ConstraintViolation(format!(
                "Account {} does not belong to tenant {}",
                account, tenant
            )));
        }
        if !self.users.contains_key(&created_by) {
            return Err(LedgerError::ConstraintViolation(format!(
                "Unknown creator {}",
                created_by
            )));
        }
        Ok(())
    }

    /// The id the next appended transaction receives.
    pub(crate) fn next_transaction_id(&self) -> Result<TransactionId, LedgerError> {
        self.last_transaction_id
            .checked_add(1)
            .map(TransactionId)
            .ok_or_else(|| LedgerError::ConstraintViolation("transaction id space exhausted".into()))
    }

    /// Appends a new transaction. The row must carry a fresh id and version 1.
    pub(crate) fn append_transaction(&mut self, txn: Transaction) -> Result<(), LedgerError> {
        require_assignable("Transaction", txn.id.0)?;
        if self.transactions.contains_key(&txn.id) {
            return Err(LedgerError::ConstraintViolation(format!(
                "Transaction {} already exists",
                txn.id
            )));
        }
        if txn.version != 1 {
            return Err(LedgerError::ConstraintViolation(format!(
                "New transaction {} must start at version 1",
                txn.id
            )));
        }
        self.check_transaction_refs(txn.tenant, txn.account, txn.created_by)?;
        self.last_transaction_id = self.last_transaction_id.max(txn.id.0);
        self.transactions.insert(txn.id, txn);
        Ok(())
    }

    /// Replaces an existing transaction. The new row must be exactly one
    /// version ahead of the stored one.
    pub(crate) fn replace_transaction(&mut self, txn: Transaction) -> Result<(), LedgerError> {
        match self.transactions.get(&txn.id) {
            Some(prev) if txn.version == prev.version + 1 => {}
            Some(_) => {
                return Err(LedgerError::ConstraintViolation(format!(
                    "Version monotonicity violated for transaction {}",
                    txn.id
                )));
            }
            None => return Err(LedgerError::unknown_transaction(txn.id)),
        }
        self.check_transaction_refs(txn.tenant, txn.account, txn.created_by)?;
        self.transactions.insert(txn.id, txn);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn state() -> LedgerState {
        let mut s = LedgerState::default();
        s.insert_tenant(Tenant { id: TenantId(1001), name: "Acme".into() }).unwrap();
        s.insert_tenant(Tenant { id: TenantId(1002), name: "Globex".into() }).unwrap();
        s.insert_user(User {
            id: UserId(501),
            login: "alice".into(),
            display_name: "Alice".into(),
            tenant: TenantId(1001),
        })
        .unwrap();
        s.insert_account(Account {
            id: AccountId(1),
            tenant: TenantId(1001),
            number: "ACC-ACME-001".into(),
            currency: "USD".parse().unwrap(),
        })
        .unwrap();
        s.insert_account(Account {
            id: AccountId(3),
            tenant: TenantId(1002),
            number: "ACC-GLOBEX-001".into(),
            currency: "EUR".parse().unwrap(),
        })
        .unwrap();
        s
    }

    fn txn(id: i64, version: u64) -> Transaction {
        Transaction {
            id: TransactionId(id),
            tenant: TenantId(1001),
            account: AccountId(1),
            occurred_at: Utc::now(),
            kind: TransactionKind::Deposit,
            amount: dec!(1.00),
            created_by: UserId(501),
            version,
        }
    }

    #[test]
    fn duplicate_logins_and_numbers_are_rejected() {
        let mut s = state();
        let err = s
            .insert_user(User {
                id: UserId(502),
                login: "alice".into(),
                display_name: "Other".into(),
                tenant: TenantId(1001),
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConstraintViolation(_)));
        let err = s
            .insert_account(Account {
                id: AccountId(2),
                tenant: TenantId(1001),
                number: "ACC-ACME-001".into(),
                currency: "USD".parse().unwrap(),
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConstraintViolation(_)));
        assert!(s.user(UserId(502)).is_none());
        assert!(s.account(AccountId(2)).is_none());
    }

    #[test]
    fn unknown_tenant_is_a_constraint_violation() {
        let mut s = state();
        let err = s
            .insert_user(User {
                id: UserId(600),
                login: "ghost".into(),
                display_name: "Ghost".into(),
                tenant: TenantId(9999),
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConstraintViolation(_)));
    }

    #[test]
    fn sentinel_ids_cannot_be_stored() {
        let mut s = LedgerState::default();
        assert!(s.insert_tenant(Tenant { id: TenantId::NONE, name: "x".into() }).is_err());
        assert_eq!(s.tenant_count(), 0);
    }

    #[test]
    fn cross_tenant_grants_are_rejected() {
        let mut s = state();
        let err = s
            .upsert_grant(AccessGrant { user: UserId(501), account: AccountId(3), can_mutate: false })
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConstraintViolation(_)));
        assert!(s.grant(UserId(501), AccountId(3)).is_none());
    }

    #[test]
    fn grant_upsert_replaces_and_remove_returns_previous() {
        let mut s = state();
        let first = AccessGrant { user: UserId(501), account: AccountId(1), can_mutate: false };
        assert_eq!(s.upsert_grant(first).unwrap(), None);
        let second = AccessGrant { can_mutate: true, ..first };
        assert_eq!(s.upsert_grant(second).unwrap(), Some(first));
        assert_eq!(s.grants_for_user(UserId(501)).count(), 1);
        assert_eq!(s.remove_grant(UserId(501), AccountId(1)), Some(second));
        assert!(s.grant(UserId(501), AccountId(1)).is_none());
    }

    #[test]
    fn transaction_refs_must_agree_on_tenant() {
        let s = state();
        assert!(s.check_transaction_refs(TenantId(1001), AccountId(1), UserId(501)).is_ok());
        assert!(s.check_transaction_refs(TenantId(1002), AccountId(1), UserId(501)).is_err());
        assert!(s.check_transaction_refs(TenantId(1001), AccountId(42), UserId(501)).is_err());
        assert!(s.check_transaction_refs(TenantId(1001), AccountId(1), UserId(999)).is_err());
    }

    #[test]
    fn id_allocation_stops_at_the_top_of_the_range() {
        let mut s = state();
        s.append_transaction(txn(i64::MAX, 1)).unwrap();
        assert!(matches!(
            s.next_transaction_id(),
            Err(LedgerError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn transaction_versions_are_monotonic() {
        let mut s = state();
        s.append_transaction(txn(1, 1)).unwrap();
        assert_eq!(s.next_transaction_id(), Ok(TransactionId(2)));
        assert!(s.append_transaction(txn(1, 1)).is_err());
        assert!(s.replace_transaction(txn(1, 3)).is_err());
        s.replace_transaction(txn(1, 2)).unwrap();
        assert_eq!(s.transaction(TransactionId(1)).unwrap().version, 2);
        assert!(matches!(
            s.replace_transaction(txn(7, 2)),
            Err(LedgerError::NotFound(_))
        ));
    }
}
