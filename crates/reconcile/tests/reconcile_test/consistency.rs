//! Eventual consistency: reads right after a write get one retry.

use fdsync_reconcile::ReconcileError;

use crate::support::*;

#[tokio::test]
async fn test_read_retries_a_transient_not_found() {
    let (store, reconciler, _, created) = created_payments().await;
    store.inject_not_found("get_variable", 1);
    store.inject_not_found("get_detector_version", 1);
    store.inject_not_found("get_rules", 1);

    let model = reconciler.read(&created).await.expect("read after retry");
    assert_eq!(model, created);
}

#[tokio::test]
async fn test_read_gives_up_after_one_retry() {
    let (store, reconciler, _, created) = created_payments().await;
    store.inject_not_found("get_variable", 2);

    let err = reconciler.read(&created).await.unwrap_err();
    assert!(matches!(err, ReconcileError::InternalFailure(_)));
}

#[tokio::test]
async fn test_update_survives_lagging_reads() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.rules[0].expression = "$ip == \"10.0.0.4\"".into();
    // the first reads after the variable and event type writes lag behind
    store.inject_not_found("get_variable", 1);
    store.inject_not_found("get_event_type", 1);

    let updated = reconciler.update(&desired, &created).await.expect("update");
    assert_eq!(updated.rules[0].expression, "$ip == \"10.0.0.4\"");
}
