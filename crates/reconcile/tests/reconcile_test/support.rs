//! Shared fixtures: an in-memory store, a reconciler over it and a few
//! canned detector models.

use std::sync::Arc;

use fdsync_core::config::RemoteTuning;
use fdsync_core::{Detector, EntityType, EventType, EventVariable, Label, Outcome, Rule, Tag};
use fdsync_reconcile::DetectorReconciler;
use fdsync_remote::{
    EventTypeSpec, FraudDetectorApi, InMemoryFraudDetector, NamedKind, NamedSpec, VariableSpec,
};

pub fn tuning() -> RemoteTuning {
    RemoteTuning {
        max_pages: 10,
        consistency_delay_ms: 0,
    }
}

pub fn store() -> Arc<InMemoryFraudDetector> {
    Arc::new(InMemoryFraudDetector::default())
}

pub fn reconciler(store: &Arc<InMemoryFraudDetector>) -> DetectorReconciler {
    DetectorReconciler::new(store.clone(), tuning())
}

pub fn rule(detector_id: &str, rule_id: &str, expression: &str, outcomes: Vec<Outcome>) -> Rule {
    Rule {
        rule_id: rule_id.into(),
        detector_id: detector_id.into(),
        expression: expression.into(),
        language: "DETECTORPL".into(),
        outcomes,
        ..Default::default()
    }
}

pub async fn seed_named(store: &InMemoryFraudDetector, kind: NamedKind, name: &str) -> String {
    store
        .put_named(
            kind,
            &NamedSpec {
                name: name.into(),
                ..Default::default()
            },
        )
        .await
        .expect("seed named resource");
    store
        .get_named(kind, name)
        .await
        .expect("seeded resource")
        .arn
        .expect("seeded arn")
}

/// An event type owned by nobody in particular, with one variable and one
/// entity type.
pub async fn seed_shared_event_type(store: &InMemoryFraudDetector) -> String {
    store
        .create_variable(&VariableSpec {
            name: "amount".into(),
            data_type: "FLOAT".into(),
            data_source: "EVENT".into(),
            default_value: "0.0".into(),
            ..Default::default()
        })
        .await
        .expect("seed variable");
    seed_named(store, NamedKind::EntityType, "account").await;
    store
        .put_event_type(&EventTypeSpec {
            name: "shared_event".into(),
            event_variables: vec!["amount".into()],
            entity_types: vec!["account".into()],
            ..Default::default()
        })
        .await
        .expect("seed event type");
    store.arn("event-type/shared_event")
}

/// `payments`: inline event type `purchase` with an inline variable, an
/// inline entity type and a referenced label `legit`; one rule with an
/// inline outcome.
pub fn payments(legit_arn: &str) -> Detector {
    Detector {
        detector_id: "payments".into(),
        description: Some("card payments".into()),
        event_type: EventType {
            name: Some("purchase".into()),
            inline: true,
            description: Some("a card purchase".into()),
            event_variables: vec![EventVariable::inline("ip", "EVENT", "STRING", "0.0.0.0")],
            entity_types: vec![EntityType::inline("customer")],
            labels: vec![Label::inline("fraud"), Label::referenced(legit_arn)],
            ..Default::default()
        },
        rules: vec![rule(
            "payments",
            "high_risk",
            "$ip == \"10.0.0.1\"",
            vec![Outcome::inline("review")],
        )],
        ..Default::default()
    }
}

pub fn tag(key: &str, value: &str) -> Tag {
    Tag::new(key, value)
}

/// `payments` created in a fresh store: `(store, reconciler, desired, created)`.
pub async fn created_payments() -> (Arc<InMemoryFraudDetector>, DetectorReconciler, Detector, Detector) {
    let store = store();
    let legit = seed_named(&store, NamedKind::Label, "legit").await;
    store.clear_calls();
    let reconciler = reconciler(&store);
    let desired = payments(&legit);
    let created = reconciler.create(&desired).await.expect("create payments");
    (store, reconciler, desired, created)
}
