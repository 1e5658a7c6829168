//! Existence checks: a remote "get" with not-found folded into `None`.

use fdsync_core::ModelVersionKey;

use crate::api::FraudDetectorApi;
use crate::error::RemoteResult;
use crate::types::*;

/// `Ok(None)` for not-found, any other error passes through.
pub fn found<T>(result: RemoteResult<T>) -> RemoteResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn find_detector(
    api: &dyn FraudDetectorApi,
    detector_id: &str,
) -> RemoteResult<Option<DetectorRecord>> {
    let page = found(api.get_detectors(Some(detector_id), None).await)?;
    Ok(page.and_then(|p| p.items.into_iter().find(|d| d.detector_id == detector_id)))
}

pub async fn find_named(
    api: &dyn FraudDetectorApi,
    kind: NamedKind,
    name: &str,
) -> RemoteResult<Option<NamedRecord>> {
    found(api.get_named(kind, name).await)
}

pub async fn find_variable(
    api: &dyn FraudDetectorApi,
    name: &str,
) -> RemoteResult<Option<VariableRecord>> {
    found(api.get_variable(name).await)
}

pub async fn find_event_type(
    api: &dyn FraudDetectorApi,
    name: &str,
) -> RemoteResult<Option<EventTypeRecord>> {
    found(api.get_event_type(name).await)
}

pub async fn find_external_model(
    api: &dyn FraudDetectorApi,
    model_endpoint: &str,
) -> RemoteResult<Option<ExternalModelRecord>> {
    found(api.get_external_model(model_endpoint).await)
}

pub async fn find_model_version(
    api: &dyn FraudDetectorApi,
    key: &ModelVersionKey,
) -> RemoteResult<Option<ModelVersionRecord>> {
    found(api.get_model_version(key).await)
}

/// Existence of any name-addressed resource.
pub async fn exists(api: &dyn FraudDetectorApi, kind: ResourceKind, name: &str) -> RemoteResult<bool> {
    Ok(match kind {
        ResourceKind::Detector => find_detector(api, name).await?.is_some(),
        ResourceKind::EventType => find_event_type(api, name).await?.is_some(),
        ResourceKind::Variable => find_variable(api, name).await?.is_some(),
        ResourceKind::Label => find_named(api, NamedKind::Label, name).await?.is_some(),
        ResourceKind::EntityType => find_named(api, NamedKind::EntityType, name).await?.is_some(),
        ResourceKind::Outcome => find_named(api, NamedKind::Outcome, name).await?.is_some(),
    })
}
