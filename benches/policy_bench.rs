use criterion::{criterion_group, criterion_main, Criterion};
use ledgerguard_core::fixtures::{self, ACME, ACME_AUDITOR, ACME_TRADER, GLOBEX};

fn policy_benchmarks(c: &mut Criterion) {
    let ledger = fixtures::tutorial_ledger();
    let trader = fixtures::member(&ledger, ACME, ACME_TRADER);
    let auditor = fixtures::member(&ledger, ACME, ACME_AUDITOR);
    let foreign = fixtures::member(&ledger, GLOBEX, ACME_TRADER);

    c.bench_function("list_visible_transactions_trader", |b| {
        b.iter(|| ledger.list_visible_transactions(&trader))
    });

    c.bench_function("list_visible_accounts_auditor", |b| {
        b.iter(|| ledger.list_visible_accounts(&auditor))
    });

    c.bench_function("list_visible_transactions_foreign_tenant", |b| {
        b.iter(|| ledger.list_visible_transactions(&foreign))
    });
}

criterion_group!(benches, policy_benchmarks);
criterion_main!(benches);
