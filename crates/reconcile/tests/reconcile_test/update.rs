//! Update path: invariants, version lifecycle and orphan collection.

use fdsync_core::{DetectorVersionStatus, EventVariable, Label, Outcome};
use fdsync_reconcile::ReconcileError;
use fdsync_remote::{FraudDetectorApi, NamedKind, RuleQuery, RuleRef};

use crate::support::*;

fn ids(rules: &[RuleRef]) -> Vec<String> {
    rules.iter().map(ToString::to_string).collect()
}

// ── Invariants ────────────────────────────────────────────────

#[tokio::test]
async fn test_update_changing_variable_data_source_is_rejected() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.event_type.event_variables[0].data_source = Some("MODEL_SCORE".into());
    store.clear_calls();

    let err = reconciler.update(&desired, &created).await.unwrap_err();

    assert!(matches!(&err, ReconcileError::InvalidRequest(m) if m.contains("DataSource")));
    assert!(store.calls().is_empty(), "mutated: {:?}", store.calls());
}

#[tokio::test]
async fn test_update_changing_variable_data_type_is_rejected() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.event_type.event_variables[0].data_type = Some("INTEGER".into());
    store.clear_calls();

    let err = reconciler.update(&desired, &created).await.unwrap_err();

    assert!(matches!(&err, ReconcileError::InvalidRequest(m) if m.contains("DataType")));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_update_removing_a_variable_is_rejected() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.event_type.event_variables.clear();
    store.clear_calls();

    let err = reconciler.update(&desired, &created).await.unwrap_err();

    assert_eq!(err, ReconcileError::invalid("cannot remove event variables: ip"));
    assert!(store.calls().is_empty());
    assert!(store.get_variable("ip").await.is_ok());
}

#[tokio::test]
async fn test_update_variable_type_is_set_once() {
    let (_, reconciler, mut desired, created) = created_payments().await;
    desired.event_type.event_variables[0].default_value = Some("127.0.0.1".into());
    desired.event_type.event_variables[0].variable_type = Some("IP_ADDRESS".into());

    let updated = reconciler.update(&desired, &created).await.expect("update");
    let ip = &updated.event_type.event_variables[0];
    assert_eq!(ip.default_value.as_deref(), Some("127.0.0.1"));
    assert_eq!(ip.variable_type.as_deref(), Some("IP_ADDRESS"));

    desired.event_type.event_variables[0].variable_type = Some("FREE_FORM_TEXT".into());
    let err = reconciler.update(&desired, &updated).await.unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_update_detector_id_is_not_updatable() {
    let (_, reconciler, mut desired, created) = created_payments().await;
    desired.detector_id = "payments_v2".into();
    for rule in &mut desired.rules {
        rule.detector_id = "payments_v2".into();
    }

    let err = reconciler.update(&desired, &created).await.unwrap_err();
    assert!(matches!(err, ReconcileError::NotUpdatable(_)));
}

#[tokio::test]
async fn test_update_missing_detector_is_not_found() {
    let store = store();
    let legit = seed_named(&store, NamedKind::Label, "legit").await;
    let desired = payments(&legit);

    let err = reconciler(&store).update(&desired, &desired).await.unwrap_err();
    assert_eq!(err, ReconcileError::not_found("Detector", "payments"));
}

#[tokio::test]
async fn test_update_event_type_rename_is_rejected() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.event_type.name = Some("refund".into());
    store.clear_calls();

    let err = reconciler.update(&desired, &created).await.unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidRequest(_)));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_update_referenced_label_cannot_turn_inline() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.event_type.labels[1] = Label::inline("legit");
    store.clear_calls();

    let err = reconciler.update(&desired, &created).await.unwrap_err();
    assert_eq!(err, ReconcileError::already_exists("Label", "legit"));
    assert!(store.calls().is_empty());
}

// ── Version lifecycle ─────────────────────────────────────────

#[tokio::test]
async fn test_update_draft_version_in_place() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.description = Some("card payments, second pass".into());
    desired.rules[0].expression = "$ip == \"10.0.0.2\"".into();
    store.clear_calls();

    let report = reconciler
        .update_with_report(&desired, &created)
        .await
        .expect("update");

    assert_eq!(report.written_version, "1");
    assert!(report.sweep.versions_deleted.is_empty());
    assert_eq!(ids(&report.sweep.rule_versions_deleted), vec!["payments/high_risk/1"]);
    assert!(report.sweep.rule_versions_retained.is_empty());

    let model = &report.model;
    assert_eq!(model.detector_version_id.as_deref(), Some("1"));
    assert_eq!(model.detector_version_status, Some(DetectorVersionStatus::Draft));
    assert_eq!(model.description.as_deref(), Some("card payments, second pass"));
    assert_eq!(model.rules[0].rule_version.as_deref(), Some("2"));
    assert_eq!(model.rules[0].expression, "$ip == \"10.0.0.2\"");

    let calls = store.calls();
    assert!(calls.contains(&"update_detector_version:payments/1".to_string()));
    assert!(!calls.iter().any(|c| c.starts_with("create_detector_version")));
    assert!(calls.iter().all(|c| !c.contains("legit")), "{calls:?}");
}

#[tokio::test]
async fn test_update_description_only_keeps_the_draft_version() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.description = Some("card payments, reworded".into());
    store.clear_calls();

    let report = reconciler
        .update_with_report(&desired, &created)
        .await
        .expect("update");

    assert_eq!(report.written_version, "1");
    assert!(report.sweep.versions_deleted.is_empty());
    // rules are re-versioned even when nothing about them changed
    assert_eq!(ids(&report.sweep.rule_versions_deleted), vec!["payments/high_risk/1"]);
    assert_eq!(report.model.rules[0].rule_version.as_deref(), Some("2"));
    assert_eq!(report.model.rules[0].expression, created.rules[0].expression);
    assert_eq!(report.model.detector_version_id.as_deref(), Some("1"));
    assert_eq!(report.model.description.as_deref(), Some("card payments, reworded"));
    assert!(!store.calls().iter().any(|c| c.starts_with("create_detector_version")));
}

#[tokio::test]
async fn test_update_never_deletes_active_or_written_versions() {
    let store = store();
    let legit = seed_named(&store, NamedKind::Label, "legit").await;
    let reconciler = reconciler(&store);
    let mut desired = payments(&legit);
    desired.detector_version_status = Some(DetectorVersionStatus::Active);
    let created = reconciler.create(&desired).await.expect("create");

    // Edit while version 1 stays live.
    let mut draft = desired.clone();
    draft.detector_version_status = None;
    draft.rules[0].expression = "$ip == \"10.0.0.2\"".into();
    let first = reconciler
        .update_with_report(&draft, &created)
        .await
        .expect("draft update");

    assert_eq!(first.written_version, "2");
    assert!(first.sweep.versions_deleted.is_empty());
    assert_eq!(ids(&first.sweep.rule_versions_retained), vec!["payments/high_risk/1"]);
    assert_eq!(first.model.detector_version_status, Some(DetectorVersionStatus::Draft));
    let live = store.get_detector_version("payments", "1").await.expect("version 1");
    assert_eq!(live.status, DetectorVersionStatus::Active);

    // Promote the draft.
    let mut promote = draft.clone();
    promote.detector_version_status = Some(DetectorVersionStatus::Active);
    let second = reconciler
        .update_with_report(&promote, &first.model)
        .await
        .expect("promotion");

    assert_eq!(second.written_version, "2");
    assert!(second.sweep.versions_deleted.is_empty());
    assert_eq!(ids(&second.sweep.rule_versions_deleted), vec!["payments/high_risk/2"]);
    assert_eq!(ids(&second.sweep.rule_versions_retained), vec!["payments/high_risk/1"]);
    assert_eq!(second.model.detector_version_status, Some(DetectorVersionStatus::Active));
    assert_eq!(second.model.rules[0].rule_version.as_deref(), Some("3"));
    let demoted = store.get_detector_version("payments", "1").await.expect("version 1");
    assert_eq!(demoted.status, DetectorVersionStatus::Inactive);

    // Same model again: a fresh version replaces the ACTIVE one.
    let third = reconciler
        .update_with_report(&promote, &second.model)
        .await
        .expect("re-apply");

    assert_eq!(third.written_version, "3");
    assert_eq!(third.sweep.versions_deleted, vec!["1".to_string()]);
    assert_eq!(ids(&third.sweep.rule_versions_deleted), vec!["payments/high_risk/1"]);
    assert_eq!(ids(&third.sweep.rule_versions_retained), vec!["payments/high_risk/3"]);
    assert_eq!(third.model.rules[0].rule_version.as_deref(), Some("4"));
    assert!(store.get_detector_version("payments", "1").await.is_err());
    let previous_live = store.get_detector_version("payments", "2").await.expect("version 2");
    assert_eq!(previous_live.status, DetectorVersionStatus::Inactive);

    for report in [&first, &second, &third] {
        assert!(!report.sweep.versions_deleted.contains(&report.written_version));
    }
}

// ── Orphans ───────────────────────────────────────────────────

#[tokio::test]
async fn test_update_collects_removed_inline_children() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.event_type.labels.remove(0);
    desired.rules[0].outcomes = vec![Outcome::inline("escalate")];

    let report = reconciler
        .update_with_report(&desired, &created)
        .await
        .expect("update");

    assert_eq!(report.sweep.outcomes_deleted, vec!["review".to_string()]);
    assert!(report.sweep.outcomes_retained.is_empty());
    assert!(store.get_named(NamedKind::Label, "fraud").await.is_err());
    assert!(store.get_named(NamedKind::Outcome, "review").await.is_err());
    assert!(store.get_named(NamedKind::Outcome, "escalate").await.is_ok());
    assert!(store.get_named(NamedKind::Label, "legit").await.is_ok());

    let labels: Vec<Option<&str>> = report
        .model
        .event_type
        .labels
        .iter()
        .map(|l| l.name.as_deref())
        .collect();
    assert_eq!(labels, vec![Some("legit")]);
    assert_eq!(
        report.model.rules[0].outcomes[0].name.as_deref(),
        Some("escalate")
    );
}

#[tokio::test]
async fn test_update_replaces_a_rule() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.rules = vec![rule(
        "payments",
        "velocity",
        "$ip == \"10.0.0.3\"",
        vec![Outcome::inline("review")],
    )];

    let updated = reconciler.update(&desired, &created).await.expect("update");

    let rule_ids: Vec<&str> = updated.rules.iter().map(|r| r.rule_id.as_str()).collect();
    assert_eq!(rule_ids, vec!["velocity"]);
    let gone = store
        .get_rules(&RuleQuery::rule("payments", "high_risk"), None)
        .await
        .expect("get rules");
    assert!(gone.items.is_empty());
    assert!(store.get_named(NamedKind::Outcome, "review").await.is_ok());
}

#[tokio::test]
async fn test_update_adds_an_inline_variable() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired
        .event_type
        .event_variables
        .push(EventVariable::inline("email", "EVENT", "STRING", "<unknown>"));

    let updated = reconciler.update(&desired, &created).await.expect("update");

    let names: Vec<Option<&str>> = updated
        .event_type
        .event_variables
        .iter()
        .map(|v| v.name.as_deref())
        .collect();
    assert_eq!(names, vec![Some("ip"), Some("email")]);
    assert!(store.calls().contains(&"create_variable:email".to_string()));
}

// ── Tags ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_syncs_tags() {
    let (_, reconciler, mut desired, created) = created_payments().await;
    desired.tags = Some(vec![tag("env", "prod")]);
    desired.event_type.labels[0].tags = Some(vec![tag("team", "ops")]);

    let tagged = reconciler.update(&desired, &created).await.expect("tag");
    assert_eq!(tagged.tags, Some(vec![tag("env", "prod")]));
    assert_eq!(tagged.event_type.labels[0].tags, Some(vec![tag("team", "ops")]));

    desired.tags = None;
    desired.event_type.labels[0].tags = None;
    let untagged = reconciler.update(&desired, &tagged).await.expect("untag");
    assert_eq!(untagged.tags, None);
    assert_eq!(untagged.event_type.labels[0].tags, None);
}

#[tokio::test]
async fn test_update_keeps_outcome_of_a_retained_rule_version() {
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

    assert_eq!(ids(&report.sweep.rule_versions_retained), vec!["payments/high_risk/1"]);
    assert_eq!(report.sweep.outcomes_retained, vec!["review".to_string()]);
    assert!(report.sweep.outcomes_deleted.is_empty());
    assert!(store.get_named(NamedKind::Outcome, "review").await.is_ok());
    assert!(store.get_named(NamedKind::Outcome, "escalate").await.is_ok());
}

#[tokio::test]
async fn test_update_fails_when_a_rule_version_cannot_be_deleted() {
    let (store, reconciler, mut desired, created) = created_payments().await;
    desired.description = Some("card payments, reworded".into());
    store.inject_not_found("delete_rule", 1);

    let err = reconciler.update(&desired, &created).await.unwrap_err();

    assert!(matches!(&err, ReconcileError::InternalFailure(m) if m.contains("delete_rule")), "{err:?}");
    // the stale rule version is still there
    let rules = store
        .get_rules(&RuleQuery::detector("payments"), None)
        .await
        .expect("rules");
    assert!(rules.items.iter().any(|r| r.rule_version == "1"));
}
