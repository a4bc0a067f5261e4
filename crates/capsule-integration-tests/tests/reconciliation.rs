//! The reconciliation loop observing a ledger fed by live resolutions.

use std::sync::Arc;
use std::time::Duration;

use capsule_ledger::{CreditLedger, Reconciler};
use capsule_resolver::{CapsuleMetadata, InMemoryCatalog};
use capsule_test::{FUSION_URI, ResolverHarness, fusion_catalog, test_uri};

#[tokio::test]
async fn snapshots_follow_resolutions() {
    let ledger = Arc::new(CreditLedger::new());
    let registry = fusion_catalog();
    registry.insert(
        &test_uri("capsule://fusion/mhd64/v4.2"),
        CapsuleMetadata::new()
            .with_utid("second")
            .with_credit_root("root")
            .with_execution_cost(2.0),
    );
    let harness = ResolverHarness::with_ledger(registry, InMemoryCatalog::new(), ledger.clone());

    let handle = Reconciler::new(ledger.clone()).spawn(Duration::from_millis(10));
    let initial = handle.latest();
    assert_eq!(initial.entry_count, 0);
    assert!(initial.merkle_root.is_empty());

    harness.resolver.resolve(FUSION_URI).unwrap();
    harness
        .resolver
        .resolve("capsule://fusion/mhd64/v4.2")
        .unwrap();

    let mut rx = handle.subscribe();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.entry_count == 2),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(snapshot.merkle_root, ledger.merkle_root());
    assert!(snapshot.taken_at >= initial.taken_at);
}

#[test]
fn on_demand_snapshot_matches_ledger() {
    let harness = ResolverHarness::fusion();
    harness.resolver.resolve(FUSION_URI).unwrap();

    let snapshot = Reconciler::new(harness.ledger.clone()).reconcile();
    assert_eq!(snapshot.entry_count, 1);
    assert_eq!(snapshot.merkle_root, harness.ledger.merkle_root());
}
