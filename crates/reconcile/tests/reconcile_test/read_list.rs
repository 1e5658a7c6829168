//! Read and list: rehydration from the store alone.

use fdsync_core::Detector;
use fdsync_reconcile::ReconcileError;
use fdsync_remote::{DetectorSpec, FraudDetectorApi};

use crate::support::*;

#[tokio::test]
async fn test_read_twice_is_byte_identical() {
    let (_, reconciler, _, created) = created_payments().await;

    let first = reconciler.read(&created).await.expect("first read");
    let second = reconciler.read(&created).await.expect("second read");

    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
    assert_eq!(first, created);
}

#[tokio::test]
async fn test_read_omits_empty_optional_fields() {
    let (_, reconciler, _, created) = created_payments().await;

    let model = reconciler.read(&created).await.expect("read");
    let json = serde_json::to_value(&model).expect("serialize");

    assert!(json.get("Tags").is_none());
    assert!(json["EventType"]["EntityTypes"][0].get("Description").is_none());
    assert!(json["EventType"]["Labels"][1].get("Tags").is_none());
    assert_eq!(json["EventType"]["Labels"][1]["Inline"], false);
}

#[tokio::test]
async fn test_read_by_arn_reports_everything_inline() {
    let (store, reconciler, _, _) = created_payments().await;
    let by_arn = Detector {
        arn: Some(store.arn("detector/payments")),
        ..Default::default()
    };

    let model = reconciler.read(&by_arn).await.expect("read");

    assert_eq!(model.detector_id, "payments");
    assert_eq!(model.detector_version_id.as_deref(), Some("1"));
    assert!(model.event_type.labels.iter().all(|l| l.inline));
}

#[tokio::test]
async fn test_read_selects_the_declared_version() {
    let (_, reconciler, mut desired, created) = created_payments().await;
    desired.detector_version_status = Some(fdsync_core::DetectorVersionStatus::Active);
    let active = reconciler.update(&desired, &created).await.expect("activate");
    desired.detector_version_status = None;
    desired.rules[0].expression = "$ip == \"10.0.0.9\"".into();
    let draft = reconciler.update(&desired, &active).await.expect("draft");
    assert_eq!(draft.detector_version_id.as_deref(), Some("2"));

    let live = reconciler.read(&active).await.expect("read version 1");
    assert_eq!(live.detector_version_id.as_deref(), Some("1"));
    assert_eq!(live.rules[0].expression, "$ip == \"10.0.0.1\"");

    let mut latest = active.clone();
    latest.detector_version_id = None;
    let newest = reconciler.read(&latest).await.expect("read newest");
    assert_eq!(newest.detector_version_id.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_read_missing_detector_is_not_found() {
    let store = store();
    let ghost = Detector {
        detector_id: "ghost".into(),
        ..Default::default()
    };

    let err = reconciler(&store).read(&ghost).await.unwrap_err();
    assert_eq!(err, ReconcileError::not_found("Detector", "ghost"));
}

#[tokio::test]
async fn test_read_missing_version_is_not_found() {
    let (_, reconciler, _, mut created) = created_payments().await;
    created.detector_version_id = Some("7".into());

    let err = reconciler.read(&created).await.unwrap_err();
    assert_eq!(err, ReconcileError::not_found("DetectorVersion", "payments/7"));
}

#[tokio::test]
async fn test_read_without_identifier_is_invalid() {
    let store = store();
    let err = reconciler(&store)
        .read(&Detector::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_list_reports_every_detector() {
    let (store, reconciler, _, _) = created_payments().await;
    seed_shared_event_type(&store).await;
    store
        .put_detector(&DetectorSpec {
            detector_id: "bare".into(),
            event_type_name: "shared_event".into(),
            ..Default::default()
        })
        .await
        .expect("seed detector");

    let detectors = reconciler.list().await.expect("list");

    let ids: Vec<&str> = detectors.iter().map(|d| d.detector_id.as_str()).collect();
    assert_eq!(ids, vec!["bare", "payments"]);

    let bare = &detectors[0];
    assert!(bare.detector_version_id.is_none());
    assert!(bare.rules.is_empty());
    assert_eq!(bare.event_type.name.as_deref(), Some("shared_event"));
    assert!(bare.event_type.inline);
    let variables: Vec<Option<&str>> = bare
        .event_type
        .event_variables
        .iter()
        .map(|v| v.name.as_deref())
        .collect();
    assert_eq!(variables, vec![Some("amount")]);

    let payments = &detectors[1];
    assert_eq!(payments.rules.len(), 1);
    assert!(payments.event_type.labels.iter().all(|l| l.inline));
}

#[tokio::test]
async fn test_list_pages_through_detectors() {
    let store = std::sync::Arc::new(fdsync_remote::InMemoryFraudDetector::default().with_page_size(1));
    seed_shared_event_type(&store).await;
    for id in ["a", "b", "c"] {
        store
            .put_detector(&DetectorSpec {
                detector_id: id.into(),
                event_type_name: "shared_event".into(),
                ..Default::default()
            })
            .await
            .expect("seed detector");
    }

    let detectors = reconciler(&store).list().await.expect("list");
    assert_eq!(detectors.len(), 3);
}
