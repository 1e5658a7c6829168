//! The remote store contract.

use fdsync_core::{DetectorVersionStatus, ModelVersionKey, Tag};

use crate::error::RemoteResult;
use crate::paging::Page;
use crate::types::*;

/// Abstraction over the fraud-detection resource API.
///
/// Implementations report a missing resource as `RemoteError::NotFound`,
/// a duplicate as `AlreadyExists` and a dependency still in use as
/// `Conflict`. List-style calls return one [`Page`] per invocation; the
/// caller drives pagination.
#[async_trait::async_trait]
pub trait FraudDetectorApi: Send + Sync {
    // ── Detectors ──────────────────────────────────────────────

    async fn put_detector(&self, spec: &DetectorSpec) -> RemoteResult<()>;

    /// With `Some(id)` returns that single detector or `NotFound`.
    async fn get_detectors(
        &self,
        detector_id: Option<&str>,
        next_token: Option<String>,
    ) -> RemoteResult<Page<DetectorRecord>>;

    async fn describe_detector(
        &self,
        detector_id: &str,
        next_token: Option<String>,
    ) -> RemoteResult<Page<DetectorVersionSummary>>;

    // ── Detector versions ──────────────────────────────────────

    /// Returns the new version id. The version starts in DRAFT.
    async fn create_detector_version(&self, spec: &DetectorVersionSpec) -> RemoteResult<String>;

    /// Rewrites a DRAFT version in place. Tags in `spec` are ignored.
    async fn update_detector_version(
        &self,
        detector_version_id: &str,
        spec: &DetectorVersionSpec,
    ) -> RemoteResult<()>;

    async fn get_detector_version(
        &self,
        detector_id: &str,
        detector_version_id: &str,
    ) -> RemoteResult<DetectorVersionRecord>;

    async fn update_detector_version_status(
        &self,
        detector_id: &str,
        detector_version_id: &str,
        status: DetectorVersionStatus,
    ) -> RemoteResult<()>;

    async fn delete_detector_version(
        &self,
        detector_id: &str,
        detector_version_id: &str,
    ) -> RemoteResult<()>;

    // ── Rules ──────────────────────────────────────────────────

    async fn create_rule(&self, spec: &RuleSpec) -> RemoteResult<RuleRef>;

    /// Issues a new version of `rule` carrying the full `spec`.
    async fn update_rule_version(&self, rule: &RuleRef, spec: &RuleSpec) -> RemoteResult<RuleRef>;

    async fn get_rules(
        &self,
        query: &RuleQuery,
        next_token: Option<String>,
    ) -> RemoteResult<Page<RuleRecord>>;

    async fn delete_rule(&self, rule: &RuleRef) -> RemoteResult<()>;

    // ── Labels, entity types and outcomes ──────────────────────

    async fn put_named(&self, kind: NamedKind, spec: &NamedSpec) -> RemoteResult<()>;

    async fn get_named(&self, kind: NamedKind, name: &str) -> RemoteResult<NamedRecord>;

    // ── Variables ──────────────────────────────────────────────

    async fn create_variable(&self, spec: &VariableSpec) -> RemoteResult<()>;

    async fn update_variable(&self, update: &VariableUpdate) -> RemoteResult<()>;

    async fn get_variable(&self, name: &str) -> RemoteResult<VariableRecord>;

    // ── Event types ────────────────────────────────────────────

    async fn put_event_type(&self, spec: &EventTypeSpec) -> RemoteResult<()>;

    async fn get_event_type(&self, name: &str) -> RemoteResult<EventTypeRecord>;

    /// Deletes a name-addressed resource of any kind, including a detector.
    async fn delete_resource(&self, kind: ResourceKind, name: &str) -> RemoteResult<()>;

    // ── Models ─────────────────────────────────────────────────

    async fn get_external_model(&self, model_endpoint: &str) -> RemoteResult<ExternalModelRecord>;

    async fn get_model_version(&self, key: &ModelVersionKey) -> RemoteResult<ModelVersionRecord>;

    // ── Tags ───────────────────────────────────────────────────

    async fn list_tags_for_resource(
        &self,
        resource_arn: &str,
        next_token: Option<String>,
    ) -> RemoteResult<Page<Tag>>;

    async fn tag_resource(&self, resource_arn: &str, tags: &[Tag]) -> RemoteResult<()>;

    async fn untag_resource(&self, resource_arn: &str, tag_keys: &[String]) -> RemoteResult<()>;
}
