//! Delete path: everything the detector owns goes, references stay.

use fdsync_core::{Detector, DetectorVersionStatus, EventType, Outcome};
use fdsync_reconcile::ReconcileError;
use fdsync_remote::existence::find_detector;
use fdsync_remote::{FraudDetectorApi, NamedKind};

use crate::support::*;

#[tokio::test]
async fn test_delete_removes_inline_graph_and_keeps_references() {
    let (store, reconciler, _, created) = created_payments().await;

    reconciler.delete(&created).await.expect("delete");

    assert!(find_detector(&*store, "payments").await.expect("lookup").is_none());
    assert!(store.get_event_type("purchase").await.is_err());
    assert!(store.get_variable("ip").await.is_err());
    assert!(store.get_named(NamedKind::EntityType, "customer").await.is_err());
    assert!(store.get_named(NamedKind::Label, "fraud").await.is_err());
    assert!(store.get_named(NamedKind::Outcome, "review").await.is_err());

    assert!(store.get_named(NamedKind::Label, "legit").await.is_ok());
    assert!(store.calls().iter().all(|c| !c.contains("legit")));
}

#[tokio::test]
async fn test_delete_deactivates_the_live_version_first() {
    let store = store();
    let legit = seed_named(&store, NamedKind::Label, "legit").await;
    let reconciler = reconciler(&store);
    let mut desired = payments(&legit);
    desired.detector_version_status = Some(DetectorVersionStatus::Active);
    let created = reconciler.create(&desired).await.expect("create");
    store.clear_calls();

    reconciler.delete(&created).await.expect("delete");

    let calls = store.calls();
    assert_eq!(calls[0], "update_detector_version_status:payments/1=INACTIVE");
    assert_eq!(calls[1], "delete_detector_version:payments/1");
}

#[tokio::test]
async fn test_delete_removes_outcomes_kept_by_an_earlier_sweep() {
    let store = store();
    let legit = seed_named(&store, NamedKind::Label, "legit").await;
    let reconciler = reconciler(&store);
    let mut desired = payments(&legit);
    desired.detector_version_status = Some(DetectorVersionStatus::Active);
    let created = reconciler.create(&desired).await.expect("create");

    desired.detector_version_status = None;
    desired.rules[0].outcomes = vec![Outcome::inline("escalate")];
    let report = reconciler
        .update_with_report(&desired, &created)
        .await
        .expect("update");
    assert_eq!(report.sweep.outcomes_retained, vec!["review".to_string()]);

    reconciler.delete(&report.model).await.expect("delete");

    assert!(store.get_named(NamedKind::Outcome, "review").await.is_err());
    assert!(store.get_named(NamedKind::Outcome, "escalate").await.is_err());
    assert!(store.get_named(NamedKind::Label, "legit").await.is_ok());
    assert!(find_detector(&*store, "payments").await.expect("lookup").is_none());
}

#[tokio::test]
async fn test_delete_leaves_a_shared_event_type_alone() {
    let store = store();
    let shared = seed_shared_event_type(&store).await;
    let block = seed_named(&store, NamedKind::Outcome, "block").await;
    let reconciler = reconciler(&store);

    let desired = Detector {
        detector_id: "refunds".into(),
        event_type: EventType {
            arn: Some(shared),
            inline: false,
            ..Default::default()
        },
        rules: vec![rule(
            "refunds",
            "big_refund",
            "$amount > 1000",
            vec![Outcome::referenced(block), Outcome::inline("refund_review")],
        )],
        ..Default::default()
    };
    let created = reconciler.create(&desired).await.expect("create");
    store.clear_calls();

    reconciler.delete(&created).await.expect("delete");

    assert!(store.get_event_type("shared_event").await.is_ok());
    assert!(store.get_variable("amount").await.is_ok());
    assert!(store.get_named(NamedKind::EntityType, "account").await.is_ok());
    assert!(store.get_named(NamedKind::Outcome, "block").await.is_ok());
    assert!(store.get_named(NamedKind::Outcome, "refund_review").await.is_err());
    assert_eq!(
        store.calls(),
        vec![
            "delete_detector_version:refunds/1",
            "delete_rule:refunds/big_refund/1",
            "delete_outcome:refund_review",
            "delete_detector:refunds",
        ]
    );
}

#[tokio::test]
async fn test_delete_by_arn_only() {
    let (store, reconciler, _, _) = created_payments().await;
    let by_arn = Detector {
        arn: Some(store.arn("detector/payments")),
        ..Default::default()
    };

    reconciler.delete(&by_arn).await.expect("delete");

    assert!(find_detector(&*store, "payments").await.expect("lookup").is_none());
    // without a model nothing is known to be inline beyond the detector itself
    assert!(store.get_event_type("purchase").await.is_ok());
}

#[tokio::test]
async fn test_delete_missing_detector_is_not_found() {
    let store = store();
    let ghost = Detector {
        detector_id: "ghost".into(),
        ..Default::default()
    };

    let err = reconciler(&store).delete(&ghost).await.unwrap_err();
    assert_eq!(err, ReconcileError::not_found("Detector", "ghost"));
}
