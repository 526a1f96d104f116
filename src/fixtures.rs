//! Test fixtures: the two-tenant brokerage scenario.
//!
//! Tenant 1001 (Acme) has a trader (501, mutate grants on ACC-ACME-001 and
//! ACC-ACME-002) and an auditor (502, read-only grants on both). Tenant 1002
//! (Globex) has one trader (601) on ACC-GLOBEX-001.

use crate::access::SessionContext;
use crate::ledger::{Ledger, SeedData};
use crate::types::{AccountId, TenantId, UserId};

pub const TUTORIAL_SEED_JSON: &str = include_str!("../fixtures/tutorial_seed.json");

pub const ACME: TenantId = TenantId(1001);
pub const GLOBEX: TenantId = TenantId(1002);
pub const ACME_TRADER: UserId = UserId(501);
pub const ACME_AUDITOR: UserId = UserId(502);
pub const GLOBEX_TRADER: UserId = UserId(601);
pub const ACC_ACME_001: AccountId = AccountId(1);
pub const ACC_ACME_002: AccountId = AccountId(2);
pub const ACC_GLOBEX_001: AccountId = AccountId(3);

/// Identity used for provisioning in fixtures.
pub const ADMIN_TENANT: TenantId = TenantId(1);
pub const ADMIN_USER: UserId = UserId(1);

pub fn tutorial_seed() -> SeedData {
    SeedData::from_json_str(TUTORIAL_SEED_JSON).expect("bundled seed parses")
}

/// A fresh administrative context for `ledger`.
pub fn admin(ledger: &Ledger) -> SessionContext {
    let role = ledger.config().admin_role.clone();
    ledger
        .carrier()
        .set(ADMIN_TENANT.0, ADMIN_USER.0, &role)
        .expect("fresh carrier accepts admin role")
}

/// A fresh member context for `ledger`.
pub fn member(ledger: &Ledger, tenant: TenantId, user: UserId) -> SessionContext {
    let role = ledger.config().member_role.clone();
    ledger
        .carrier()
        .set(tenant.0, user.0, &role)
        .expect("fresh carrier accepts member role")
}

/// A ledger with the default configuration and the tutorial seed applied.
pub fn tutorial_ledger() -> Ledger {
    let ledger = Ledger::default();
    let ctx = admin(&ledger);
    ledger
        .load_seed(&ctx, &tutorial_seed())
        .expect("bundled seed applies");
    ledger
}
