use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use ledgerguard_core::fixtures;
use ledgerguard_core::ledger::{SeedAccount, SeedData, SeedTransaction};
use ledgerguard_core::types::{AccountId, TenantId, TransactionKind, UserId};
use ledgerguard_core::{AccessGrant, Ledger, LedgerError, NewTransaction, Tenant, User};

const TENANTS: i64 = 3;
const USERS_PER_TENANT: i64 = 2;
const ACCOUNTS_PER_TENANT: i64 = 2;

fn user_id(tenant: i64, k: i64) -> UserId {
    UserId(tenant * 100 + k)
}

fn account_id(tenant: i64, k: i64) -> AccountId {
    AccountId(tenant * 100 + 50 + k)
}

/// `grants[i]` covers user `i / ACCOUNTS_PER_TENANT` (global index) and
/// account `i % ACCOUNTS_PER_TENANT` in the same tenant.
fn build_seed(grants: &[Option<bool>]) -> SeedData {
    let mut seed = SeedData::default();
    for t in 1..=TENANTS {
        seed.tenants.push(Tenant { id: TenantId(t), name: format!("Tenant {}", t) });
        for k in 0..USERS_PER_TENANT {
            seed.users.push(User {
                id: user_id(t, k),
                login: format!("user-{}-{}", t, k),
                display_name: format!("User {} {}", t, k),
                tenant: TenantId(t),
            });
        }
        for k in 0..ACCOUNTS_PER_TENANT {
            let number = format!("ACC-{}-{}", t, k);
            seed.accounts.push(SeedAccount {
                id: account_id(t, k),
                tenant: TenantId(t),
                number: number.clone(),
                currency: "USD".parse().unwrap(),
            });
            seed.transactions.push(SeedTransaction {
                id: None,
                tenant: TenantId(t),
                account: number,
                occurred_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                kind: TransactionKind::Deposit,
                amount: Decimal::new(100 * (k + 1), 0),
                created_by: user_id(t, 0),
            });
        }
    }
    let mut i = 0;
    for t in 1..=TENANTS {
        for u in 0..USERS_PER_TENANT {
            for a in 0..ACCOUNTS_PER_TENANT {
                if let Some(can_mutate) = grants[i] {
                    seed.grants.push(AccessGrant {
                        user: user_id(t, u),
                        account: account_id(t, a),
                        can_mutate,
                    });
                }
                i += 1;
            }
        }
    }
    seed
}

fn grant_of(seed: &SeedData, user: UserId, account: AccountId) -> Option<bool> {
    seed.grants
        .iter()
        .find(|g| g.user == user && g.account == account)
        .map(|g| g.can_mutate)
}

fn grant_matrix() -> impl Strategy<Value = Vec<Option<bool>>> {
    prop::collection::vec(
        prop::option::of(any::<bool>()),
        (TENANTS * USERS_PER_TENANT * ACCOUNTS_PER_TENANT) as usize,
    )
}

proptest! {
    /// Visible rows are exactly those in the context tenant with a grant for the user.
    #[test]
    fn prop_visibility_is_tenant_and_grant(
        grants in grant_matrix(),
        ctx_tenant in 1..=TENANTS,
        user_tenant in 1..=TENANTS,
        user_k in 0..USERS_PER_TENANT,
    ) {
        let seed = build_seed(&grants);
        let ledger = Ledger::default();
        ledger.load_seed(&fixtures::admin(&ledger), &seed).unwrap();
        let user = user_id(user_tenant, user_k);
        let ctx = fixtures::member(&ledger, TenantId(ctx_tenant), user);

        let accounts = ledger.list_visible_accounts(&ctx);
        for account in &accounts {
            prop_assert_eq!(account.tenant, TenantId(ctx_tenant));
            prop_assert!(grant_of(&seed, user, account.id).is_some());
        }
        let expected_accounts = seed
            .accounts
            .iter()
            .filter(|a| a.tenant == TenantId(ctx_tenant) && grant_of(&seed, user, a.id).is_some())
            .count();
        prop_assert_eq!(accounts.len(), expected_accounts);

        let txns = ledger.list_visible_transactions(&ctx);
        for txn in &txns {
            prop_assert_eq!(txn.tenant, TenantId(ctx_tenant));
            prop_assert!(grant_of(&seed, user, txn.account).is_some());
        }
        // One seeded transaction per account.
        prop_assert_eq!(txns.len(), expected_accounts);

        if ctx_tenant != user_tenant {
            prop_assert!(accounts.is_empty());
            prop_assert!(txns.is_empty());
        }
    }

    /// Inserts succeed exactly when the context tenant owns the account and the
    /// user holds a mutate grant on it.
    #[test]
    fn prop_insert_needs_mutate_grant(
        grants in grant_matrix(),
        ctx_tenant in 1..=TENANTS,
        user_tenant in 1..=TENANTS,
        user_k in 0..USERS_PER_TENANT,
        target_tenant in 1..=TENANTS,
        target_k in 0..ACCOUNTS_PER_TENANT,
    ) {
        let seed = build_seed(&grants);
        let ledger = Ledger::default();
        ledger.load_seed(&fixtures::admin(&ledger), &seed).unwrap();
        let user = user_id(user_tenant, user_k);
        let account = account_id(target_tenant, target_k);
        let ctx = fixtures::member(&ledger, TenantId(ctx_tenant), user);

        let result = ledger.insert_transaction(&ctx, NewTransaction {
            tenant: TenantId(target_tenant),
            account,
            occurred_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            kind: TransactionKind::Trade,
            amount: Decimal::new(-5000, 2),
            created_by: user,
        });

        let expected = ctx_tenant == target_tenant && grant_of(&seed, user, account) == Some(true);
        prop_assert_eq!(result.is_ok(), expected);
        if let Err(err) = result {
            prop_assert!(matches!(err, LedgerError::AccessDenied(_)));
        }
    }
}
