use std::sync::Arc;

use parking_lot::Mutex;
use tracing::span::{Attributes, Id};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use ledgerguard_core::fixtures::*;
use ledgerguard_core::types::TransactionId;

/// Records the name of every span that carries the operation identity.
#[derive(Clone, Default)]
struct IdentifiedSpans(Arc<Mutex<Vec<&'static str>>>);

impl<S: Subscriber> Layer<S> for IdentifiedSpans {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let fields = attrs.metadata().fields();
        let identified = ["operation_id", "tenant_id", "user_id"]
            .iter()
            .all(|name| fields.field(name).is_some());
        if identified {
            self.0.lock().push(attrs.metadata().name());
        }
    }
}

#[test]
fn every_read_opens_an_identified_span() {
    let ledger = tutorial_ledger();
    let ctx = member(&ledger, ACME, ACME_TRADER);

    let spans = IdentifiedSpans::default();
    let subscriber = tracing_subscriber::registry().with(spans.clone());
    tracing::subscriber::with_default(subscriber, || {
        ledger.list_visible_accounts(&ctx);
        ledger.list_visible_transactions(&ctx);
        ledger.list_visible_transactions_for_account(&ctx, "ACC-ACME-001");
        ledger.visible_transaction(&ctx, TransactionId(1));
    });

    assert_eq!(
        *spans.0.lock(),
        vec![
            "list_visible_accounts",
            "list_visible_transactions",
            "list_visible_transactions_for_account",
            "visible_transaction",
        ]
    );
}
