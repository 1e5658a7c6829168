//! Create path: dependency resolution, guards and the rehydrated result.

use fdsync_core::{DetectorVersionStatus, Label, Outcome};
use fdsync_reconcile::ReconcileError;
use fdsync_remote::{FraudDetectorApi, NamedKind};

use crate::support::*;

#[tokio::test]
async fn test_create_builds_inline_graph_and_keeps_references() {
    let (store, _, _, created) = created_payments().await;

    assert_eq!(created.detector_id, "payments");
    assert_eq!(created.detector_version_id.as_deref(), Some("1"));
    assert_eq!(created.detector_version_status, Some(DetectorVersionStatus::Draft));
    assert_eq!(created.description.as_deref(), Some("card payments"));
    assert_eq!(
        created.arn.as_deref(),
        Some(store.arn("detector/payments").as_str())
    );

    let event_type = &created.event_type;
    assert!(event_type.inline);
    assert_eq!(event_type.name.as_deref(), Some("purchase"));
    assert_eq!(event_type.event_variables.len(), 1);
    assert_eq!(event_type.event_variables[0].data_source.as_deref(), Some("EVENT"));
    assert_eq!(event_type.event_variables[0].default_value.as_deref(), Some("0.0.0.0"));
    assert!(event_type.entity_types[0].inline);

    let labels: Vec<(Option<&str>, bool)> = event_type
        .labels
        .iter()
        .map(|l| (l.name.as_deref(), l.inline))
        .collect();
    assert_eq!(labels, vec![(Some("fraud"), true), (Some("legit"), false)]);

    // referenced items carry identity only
    assert!(event_type.labels[1].created_time.is_none());

    assert_eq!(created.rules.len(), 1);
    assert_eq!(created.rules[0].rule_version.as_deref(), Some("1"));
    assert_eq!(created.rules[0].outcomes[0].name.as_deref(), Some("review"));
    assert!(created.rules[0].outcomes[0].inline);
}

#[tokio::test]
async fn test_create_never_mutates_referenced_items() {
    let (store, _, _, _) = created_payments().await;

    let calls = store.calls();
    assert!(calls.contains(&"put_label:fraud".to_string()));
    assert!(calls.contains(&"create_detector_version:payments/1".to_string()));
    assert!(
        calls.iter().all(|c| !c.contains("legit")),
        "referenced label was mutated: {calls:?}"
    );
}

#[tokio::test]
async fn test_create_orders_dependencies_before_the_detector() {
    let (store, _, _, _) = created_payments().await;
    let calls = store.calls();
    let position = |call: &str| {
        calls
            .iter()
            .position(|c| c == call)
            .unwrap_or_else(|| panic!("missing {call} in {calls:?}"))
    };

    assert!(position("put_event_type:purchase") < position("put_detector:payments"));
    assert!(position("put_outcome:review") < position("create_rule:payments/high_risk/1"));
    assert!(position("create_rule:payments/high_risk/1") < position("create_detector_version:payments/1"));
}

#[tokio::test]
async fn test_create_with_tags_and_activation() {
    let store = store();
    let legit = seed_named(&store, NamedKind::Label, "legit").await;
    let mut desired = payments(&legit);
    desired.tags = Some(vec![tag("team", "risk")]);
    desired.detector_version_status = Some(DetectorVersionStatus::Active);

    let created = reconciler(&store).create(&desired).await.expect("create");

    assert_eq!(created.tags, Some(vec![tag("team", "risk")]));
    assert_eq!(created.detector_version_status, Some(DetectorVersionStatus::Active));
    assert!(store
        .calls()
        .contains(&"update_detector_version_status:payments/1=ACTIVE".to_string()));
}

#[tokio::test]
async fn test_create_existing_detector_is_rejected() {
    let (_, reconciler, desired, _) = created_payments().await;

    let err = reconciler.create(&desired).await.unwrap_err();
    assert_eq!(err, ReconcileError::already_exists("Detector", "payments"));
}

#[tokio::test]
async fn test_create_with_read_only_properties_is_rejected() {
    let store = store();
    let legit = seed_named(&store, NamedKind::Label, "legit").await;
    let mut desired = payments(&legit);
    desired.arn = Some(store.arn("detector/payments"));
    store.clear_calls();

    let err = reconciler(&store).create(&desired).await.unwrap_err();
    assert_eq!(err, ReconcileError::invalid("cannot create read-only properties"));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_create_missing_reference_fails_before_any_mutation() {
    let store = store();
    let desired = payments(&store.arn("label/legit"));
    let reconciler = reconciler(&store);

    let err = reconciler.create(&desired).await.unwrap_err();

    assert_eq!(err, ReconcileError::not_found("Label", "legit"));
    assert!(store.calls().is_empty(), "mutated: {:?}", store.calls());
}

#[tokio::test]
async fn test_create_inline_name_collision_is_rejected() {
    let store = store();
    let legit = seed_named(&store, NamedKind::Label, "legit").await;
    seed_named(&store, NamedKind::Outcome, "review").await;
    store.clear_calls();

    let err = reconciler(&store).create(&payments(&legit)).await.unwrap_err();

    assert_eq!(err, ReconcileError::already_exists("Outcome", "review"));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_create_rule_for_another_detector_is_invalid() {
    let store = store();
    let legit = seed_named(&store, NamedKind::Label, "legit").await;
    let mut desired = payments(&legit);
    desired.rules[0].detector_id = "refunds".into();

    let err = reconciler(&store).create(&desired).await.unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_create_inline_item_without_name_is_invalid() {
    let store = store();
    let legit = seed_named(&store, NamedKind::Label, "legit").await;
    let mut desired = payments(&legit);
    desired.event_type.labels.push(Label {
        inline: true,
        ..Default::default()
    });

    let err = reconciler(&store).create(&desired).await.unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_create_on_shared_event_type() {
    let store = store();
    let shared = seed_shared_event_type(&store).await;
    let block = seed_named(&store, NamedKind::Outcome, "block").await;
    store.clear_calls();

    let mut desired = payments("unused");
    desired.detector_id = "refunds".into();
    desired.event_type = fdsync_core::EventType {
        arn: Some(shared),
        inline: false,
        ..Default::default()
    };
    desired.rules = vec![rule(
        "refunds",
        "big_refund",
        "$amount > 1000",
        vec![Outcome::referenced(block), Outcome::inline("refund_review")],
    )];

    let created = reconciler(&store).create(&desired).await.expect("create");

    assert!(!created.event_type.inline);
    assert_eq!(created.event_type.name.as_deref(), Some("shared_event"));
    assert!(created.event_type.event_variables.is_empty());
    let outcomes: Vec<(Option<&str>, bool)> = created.rules[0]
        .outcomes
        .iter()
        .map(|o| (o.name.as_deref(), o.inline))
        .collect();
    assert_eq!(outcomes, vec![(Some("block"), false), (Some("refund_review"), true)]);

    let calls = store.calls();
    assert!(!calls.iter().any(|c| c.contains("shared_event")));
    assert!(!calls.iter().any(|c| c.ends_with(":block")));
    assert!(store.get_named(NamedKind::Outcome, "refund_review").await.is_ok());
}
