//! In-memory implementation of [`FraudDetectorApi`].
//!
//! Keeps the remote store's referential rules so the reconciler can be
//! exercised end-to-end without a network:
//!
//! - a rule version cited by any detector version cannot be deleted
//! - an ACTIVE detector version cannot be deleted
//! - variables, labels and entity types listed by an event type cannot be deleted
//! - an event type used by a detector cannot be deleted
//! - outcomes used by a rule version cannot be deleted
//! - activating a version demotes the previously ACTIVE one to INACTIVE
//! - tags passed to a create/put call only apply when the resource is new
//!
//! Every mutating call is appended to a call log as `operation:target`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use tracing::debug;

use fdsync_core::{DetectorVersionStatus, ModelVersionKey, Tag};

use crate::api::FraudDetectorApi;
use crate::error::{RemoteError, RemoteResult};
use crate::paging::Page;
use crate::types::*;

const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_ACCOUNT: &str = "123456789012";

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn named_segment(kind: NamedKind) -> &'static str {
    ResourceKind::from(kind).arn_segment()
}

#[derive(Default)]
struct State {
    detectors: BTreeMap<String, DetectorRecord>,
    versions: BTreeMap<String, BTreeMap<u64, DetectorVersionRecord>>,
    next_version: HashMap<String, u64>,
    rules: BTreeMap<(String, String), BTreeMap<u64, RuleRecord>>,
    named: HashMap<NamedKind, BTreeMap<String, NamedRecord>>,
    variables: BTreeMap<String, VariableRecord>,
    event_types: BTreeMap<String, EventTypeRecord>,
    external_models: BTreeMap<String, ExternalModelRecord>,
    model_versions: Vec<ModelVersionRecord>,
    tags: HashMap<String, Vec<Tag>>,
    calls: Vec<String>,
    not_found_faults: HashMap<String, u32>,
}

impl State {
    fn record(&mut self, operation: &str, target: &str) {
        self.calls.push(format!("{operation}:{target}"));
    }

    /// Consume one injected not-found fault for `operation`, if any.
    fn take_fault(&mut self, operation: &str) -> RemoteResult<()> {
        if let Some(remaining) = self.not_found_faults.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::NotFound(format!("{operation} (injected)")));
            }
        }
        Ok(())
    }

    fn set_tags_if_new(&mut self, arn: &str, tags: &[Tag]) {
        if !tags.is_empty() {
            self.tags.insert(arn.to_string(), tags.to_vec());
        }
    }

    fn detector(&self, detector_id: &str) -> RemoteResult<&DetectorRecord> {
        self.detectors
            .get(detector_id)
            .ok_or_else(|| RemoteError::NotFound(format!("detector {detector_id}")))
    }

    fn rule_exists(&self, rule: &RuleRef) -> bool {
        let Ok(version) = rule.rule_version.parse::<u64>() else {
            return false;
        };
        self.rules
            .get(&(rule.detector_id.clone(), rule.rule_id.clone()))
            .is_some_and(|versions| versions.contains_key(&version))
    }

    fn require_outcomes(&self, outcomes: &[String]) -> RemoteResult<()> {
        let known = self.named.get(&NamedKind::Outcome);
        for name in outcomes {
            if !known.is_some_and(|m| m.contains_key(name)) {
                return Err(RemoteError::NotFound(format!("outcome {name}")));
            }
        }
        Ok(())
    }

    fn version_mut(
        &mut self,
        detector_id: &str,
        detector_version_id: &str,
    ) -> RemoteResult<&mut DetectorVersionRecord> {
        let missing = || RemoteError::NotFound(format!("detector version {detector_id}/{detector_version_id}"));
        let id: u64 = detector_version_id.parse().map_err(|_| missing())?;
        self.versions
            .get_mut(detector_id)
            .and_then(|versions| versions.get_mut(&id))
            .ok_or_else(missing)
    }
}

/// A self-contained fraud-detection store held in process memory.
pub struct InMemoryFraudDetector {
    region: String,
    account: String,
    page_size: usize,
    state: Mutex<State>,
}

impl Default for InMemoryFraudDetector {
    fn default() -> Self {
        Self::new("us-east-1")
    }
}

impl InMemoryFraudDetector {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account: DEFAULT_ACCOUNT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            state: Mutex::new(State::default()),
        }
    }

    /// Serve list-style calls `page_size` items at a time.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn arn(&self, resource_path: &str) -> String {
        format!(
            "arn:aws:frauddetector:{}:{}:{}",
            self.region, self.account, resource_path
        )
    }

    // ── Test hooks ─────────────────────────────────────────────

    /// Mutating calls issued so far, as `operation:target`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make the next `times` calls to `operation` report not-found.
    pub fn inject_not_found(&self, operation: &str, times: u32) {
        *self
            .state()
            .not_found_faults
            .entry(operation.to_string())
            .or_insert(0) += times;
    }

    pub fn add_external_model(&self, model_endpoint: &str, status: &str) -> String {
        let arn = self.arn(&format!("external-model/{model_endpoint}"));
        self.state().external_models.insert(
            model_endpoint.to_string(),
            ExternalModelRecord {
                model_endpoint: model_endpoint.to_string(),
                status: Some(status.to_string()),
                arn: Some(arn.clone()),
            },
        );
        arn
    }

    pub fn add_model_version(&self, key: ModelVersionKey, status: &str) -> String {
        let arn = self.arn(&format!(
            "model-version/{}/{}/{}",
            key.model_type, key.model_id, key.version_number
        ));
        let mut state = self.state();
        state.model_versions.retain(|m| m.key != key);
        state.model_versions.push(ModelVersionRecord {
            key,
            status: Some(status.to_string()),
            arn: Some(arn.clone()),
        });
        arn
    }

    fn paginate<T>(&self, items: Vec<T>, next_token: Option<String>) -> RemoteResult<Page<T>> {
        let start = match next_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                RemoteError::validation("paginate", format!("invalid next token '{token}'"))
            })?,
            None => 0,
        };
        let total = items.len();
        let end = start.saturating_add(self.page_size).min(total);
        let items = items
            .into_iter()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect();
        Ok(Page {
            items,
            next_token: (end < total).then(|| end.to_string()),
        })
    }
}

#[async_trait::async_trait]
impl FraudDetectorApi for InMemoryFraudDetector {
    // ── Detectors ──────────────────────────────────────────────

    async fn put_detector(&self, spec: &DetectorSpec) -> RemoteResult<()> {
        let arn = self.arn(&format!("detector/{}", spec.detector_id));
        let mut state = self.state();
        if !state.event_types.contains_key(&spec.event_type_name) {
            return Err(RemoteError::NotFound(format!(
                "event type {}",
                spec.event_type_name
            )));
        }
        state.record("put_detector", &spec.detector_id);
        let stamp = now();
        match state.detectors.get_mut(&spec.detector_id) {
            Some(existing) => {
                existing.description = spec.description.clone();
                existing.event_type_name = spec.event_type_name.clone();
                existing.last_updated_time = Some(stamp);
            }
            None => {
                state.detectors.insert(
                    spec.detector_id.clone(),
                    DetectorRecord {
                        detector_id: spec.detector_id.clone(),
                        description: spec.description.clone(),
                        event_type_name: spec.event_type_name.clone(),
                        arn: Some(arn.clone()),
                        created_time: Some(stamp.clone()),
                        last_updated_time: Some(stamp),
                    },
                );
                state.set_tags_if_new(&arn, &spec.tags);
            }
        }
        Ok(())
    }

    async fn get_detectors(
        &self,
        detector_id: Option<&str>,
        next_token: Option<String>,
    ) -> RemoteResult<Page<DetectorRecord>> {
        let mut state = self.state();
        state.take_fault("get_detectors")?;
        match detector_id {
            Some(id) => Ok(Page::last(vec![state.detector(id)?.clone()])),
            None => {
                let all: Vec<DetectorRecord> = state.detectors.values().cloned().collect();
                drop(state);
                self.paginate(all, next_token)
            }
        }
    }

    async fn describe_detector(
        &self,
        detector_id: &str,
        next_token: Option<String>,
    ) -> RemoteResult<Page<DetectorVersionSummary>> {
        let mut state = self.state();
        state.take_fault("describe_detector")?;
        state.detector(detector_id)?;
        let summaries: Vec<DetectorVersionSummary> = state
            .versions
            .get(detector_id)
            .map(|versions| {
                versions
                    .values()
                    .map(|v| DetectorVersionSummary {
                        detector_version_id: v.detector_version_id.clone(),
                        status: v.status,
                        description: v.description.clone(),
                        last_updated_time: v.last_updated_time.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        drop(state);
        self.paginate(summaries, next_token)
    }

    // ── Detector versions ──────────────────────────────────────

    async fn create_detector_version(&self, spec: &DetectorVersionSpec) -> RemoteResult<String> {
        let mut state = self.state();
        state.detector(&spec.detector_id)?;
        if let Some(missing) = spec.rules.iter().find(|r| !state.rule_exists(r)) {
            return Err(RemoteError::NotFound(format!("rule {missing}")));
        }

        let counter = state.next_version.entry(spec.detector_id.clone()).or_insert(0);
        *counter += 1;
        let id = *counter;
        let version_id = id.to_string();
        let arn = self.arn(&format!("detector-version/{}/{}", spec.detector_id, version_id));
        let stamp = now();

        state.record(
            "create_detector_version",
            &format!("{}/{}", spec.detector_id, version_id),
        );
        state.versions.entry(spec.detector_id.clone()).or_default().insert(
            id,
            DetectorVersionRecord {
                detector_id: spec.detector_id.clone(),
                detector_version_id: version_id.clone(),
                description: spec.description.clone(),
                status: DetectorVersionStatus::Draft,
                rule_execution_mode: spec.rule_execution_mode,
                rules: spec.rules.clone(),
                external_model_endpoints: spec.external_model_endpoints.clone(),
                model_versions: spec.model_versions.clone(),
                arn: Some(arn.clone()),
                created_time: Some(stamp.clone()),
                last_updated_time: Some(stamp),
            },
        );
        state.set_tags_if_new(&arn, &spec.tags);
        debug!(detector_id = %spec.detector_id, version_id = %version_id, "created detector version");
        Ok(version_id)
    }

    async fn update_detector_version(
        &self,
        detector_version_id: &str,
        spec: &DetectorVersionSpec,
    ) -> RemoteResult<()> {
        let mut state = self.state();
        if let Some(missing) = spec.rules.iter().find(|r| !state.rule_exists(r)) {
            return Err(RemoteError::NotFound(format!("rule {missing}")));
        }
        let version = state.version_mut(&spec.detector_id, detector_version_id)?;
        if version.status != DetectorVersionStatus::Draft {
            return Err(RemoteError::validation(
                "update_detector_version",
                format!("version {detector_version_id} is {}, only DRAFT can be updated", version.status),
            ));
        }
        version.description = spec.description.clone();
        version.rule_execution_mode = spec.rule_execution_mode;
        version.rules = spec.rules.clone();
        version.external_model_endpoints = spec.external_model_endpoints.clone();
        version.model_versions = spec.model_versions.clone();
        version.last_updated_time = Some(now());
        state.record(
            "update_detector_version",
            &format!("{}/{}", spec.detector_id, detector_version_id),
        );
        Ok(())
    }

    async fn get_detector_version(
        &self,
        detector_id: &str,
        detector_version_id: &str,
    ) -> RemoteResult<DetectorVersionRecord> {
        let mut state = self.state();
        state.take_fault("get_detector_version")?;
        Ok(state.version_mut(detector_id, detector_version_id)?.clone())
    }

    async fn update_detector_version_status(
        &self,
        detector_id: &str,
        detector_version_id: &str,
        status: DetectorVersionStatus,
    ) -> RemoteResult<()> {
        let mut state = self.state();
        if status == DetectorVersionStatus::Draft {
            return Err(RemoteError::validation(
                "update_detector_version_status",
                "a version cannot be moved back to DRAFT",
            ));
        }
        state.version_mut(detector_id, detector_version_id)?;

        let stamp = now();
        if let Some(versions) = state.versions.get_mut(detector_id) {
            for version in versions.values_mut() {
                if version.detector_version_id == detector_version_id {
                    version.status = status;
                    version.last_updated_time = Some(stamp.clone());
                } else if status == DetectorVersionStatus::Active
                    && version.status == DetectorVersionStatus::Active
                {
                    version.status = DetectorVersionStatus::Inactive;
                    version.last_updated_time = Some(stamp.clone());
                }
            }
        }
        state.record(
            "update_detector_version_status",
            &format!("{detector_id}/{detector_version_id}={status}"),
        );
        Ok(())
    }

    async fn delete_detector_version(
        &self,
        detector_id: &str,
        detector_version_id: &str,
    ) -> RemoteResult<()> {
        let mut state = self.state();
        let version = state.version_mut(detector_id, detector_version_id)?;
        if version.status == DetectorVersionStatus::Active {
            return Err(RemoteError::conflict(
                "delete_detector_version",
                format!("version {detector_id}/{detector_version_id} is ACTIVE"),
            ));
        }
        let arn = version.arn.clone();
        if let Ok(id) = detector_version_id.parse::<u64>() {
            if let Some(versions) = state.versions.get_mut(detector_id) {
                versions.remove(&id);
            }
        }
        if let Some(arn) = arn {
            state.tags.remove(&arn);
        }
        state.record(
            "delete_detector_version",
            &format!("{detector_id}/{detector_version_id}"),
        );
        Ok(())
    }

    // ── Rules ──────────────────────────────────────────────────

    async fn create_rule(&self, spec: &RuleSpec) -> RemoteResult<RuleRef> {
        let mut state = self.state();
        state.detector(&spec.detector_id)?;
        state.require_outcomes(&spec.outcomes)?;
        let key = (spec.detector_id.clone(), spec.rule_id.clone());
        if state.rules.get(&key).is_some_and(|v| !v.is_empty()) {
            return Err(RemoteError::AlreadyExists(format!(
                "rule {}/{}",
                spec.detector_id, spec.rule_id
            )));
        }
        let record = self.rule_record(spec, 1);
        let rule = record.rule_ref();
        state.set_tags_if_new(record.arn.as_deref().unwrap_or_default(), &spec.tags);
        state.rules.entry(key).or_default().insert(1, record);
        state.record("create_rule", &rule.to_string());
        Ok(rule)
    }

    async fn update_rule_version(&self, rule: &RuleRef, spec: &RuleSpec) -> RemoteResult<RuleRef> {
        let mut state = self.state();
        if !state.rule_exists(rule) {
            return Err(RemoteError::NotFound(format!("rule {rule}")));
        }
        state.require_outcomes(&spec.outcomes)?;
        let key = (rule.detector_id.clone(), rule.rule_id.clone());
        let next = state
            .rules
            .get(&key)
            .and_then(|versions| versions.keys().next_back().copied())
            .unwrap_or(0)
            + 1;
        let record = self.rule_record(spec, next);
        let new_ref = record.rule_ref();
        state.set_tags_if_new(record.arn.as_deref().unwrap_or_default(), &spec.tags);
        state.rules.entry(key).or_default().insert(next, record);
        state.record("update_rule_version", &new_ref.to_string());
        Ok(new_ref)
    }

    async fn get_rules(
        &self,
        query: &RuleQuery,
        next_token: Option<String>,
    ) -> RemoteResult<Page<RuleRecord>> {
        let mut state = self.state();
        state.take_fault("get_rules")?;
        state.detector(&query.detector_id)?;
        if query.rule_version.is_some() && query.rule_id.is_none() {
            return Err(RemoteError::validation(
                "get_rules",
                "rule_version requires rule_id",
            ));
        }

        let records: Vec<RuleRecord> = state
            .rules
            .iter()
            .filter(|((detector_id, rule_id), _)| {
                detector_id == &query.detector_id
                    && query.rule_id.as_ref().map_or(true, |wanted| wanted == rule_id)
            })
            .flat_map(|(_, versions)| versions.values())
            .filter(|r| {
                query
                    .rule_version
                    .as_ref()
                    .map_or(true, |wanted| wanted == &r.rule_version)
            })
            .cloned()
            .collect();

        if query.rule_version.is_some() && records.is_empty() {
            return Err(RemoteError::NotFound(format!(
                "rule {}/{}/{}",
                query.detector_id,
                query.rule_id.as_deref().unwrap_or_default(),
                query.rule_version.as_deref().unwrap_or_default()
            )));
        }
        drop(state);
        self.paginate(records, next_token)
    }

    async fn delete_rule(&self, rule: &RuleRef) -> RemoteResult<()> {
        let mut state = self.state();
        state.take_fault("delete_rule")?;
        if !state.rule_exists(rule) {
            return Err(RemoteError::NotFound(format!("rule {rule}")));
        }
        let cited_by = state.versions.get(&rule.detector_id).and_then(|versions| {
            versions
                .values()
                .find(|v| v.rules.contains(rule))
                .map(|v| v.detector_version_id.clone())
        });
        if let Some(version_id) = cited_by {
            return Err(RemoteError::conflict(
                "delete_rule",
                format!("rule {rule} is used by detector version {version_id}"),
            ));
        }

        let key = (rule.detector_id.clone(), rule.rule_id.clone());
        let mut removed_arn = None;
        if let (Some(versions), Ok(version)) =
            (state.rules.get_mut(&key), rule.rule_version.parse::<u64>())
        {
            removed_arn = versions.remove(&version).and_then(|r| r.arn);
            if versions.is_empty() {
                state.rules.remove(&key);
            }
        }
        if let Some(arn) = removed_arn {
            state.tags.remove(&arn);
        }
        state.record("delete_rule", &rule.to_string());
        Ok(())
    }

    // ── Labels, entity types and outcomes ──────────────────────

    async fn put_named(&self, kind: NamedKind, spec: &NamedSpec) -> RemoteResult<()> {
        let arn = self.arn(&format!("{}/{}", named_segment(kind), spec.name));
        let mut state = self.state();
        state.record(&format!("put_{}", named_segment(kind).replace('-', "_")), &spec.name);
        let stamp = now();
        let records = state.named.entry(kind).or_default();
        match records.get_mut(&spec.name) {
            Some(existing) => {
                existing.description = spec.description.clone();
                existing.last_updated_time = Some(stamp);
            }
            None => {
                records.insert(
                    spec.name.clone(),
                    NamedRecord {
                        name: spec.name.clone(),
                        description: spec.description.clone(),
                        arn: Some(arn.clone()),
                        created_time: Some(stamp.clone()),
                        last_updated_time: Some(stamp),
                    },
                );
                state.set_tags_if_new(&arn, &spec.tags);
            }
        }
        Ok(())
    }

    async fn get_named(&self, kind: NamedKind, name: &str) -> RemoteResult<NamedRecord> {
        let mut state = self.state();
        state.take_fault("get_named")?;
        state
            .named
            .get(&kind)
            .and_then(|records| records.get(name))
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("{} {name}", named_segment(kind))))
    }

    // ── Variables ──────────────────────────────────────────────

    async fn create_variable(&self, spec: &VariableSpec) -> RemoteResult<()> {
        let arn = self.arn(&format!("variable/{}", spec.name));
        let mut state = self.state();
        if state.variables.contains_key(&spec.name) {
            return Err(RemoteError::AlreadyExists(format!("variable {}", spec.name)));
        }
        let stamp = now();
        state.variables.insert(
            spec.name.clone(),
            VariableRecord {
                name: spec.name.clone(),
                data_type: spec.data_type.clone(),
                data_source: spec.data_source.clone(),
                default_value: spec.default_value.clone(),
                description: spec.description.clone(),
                variable_type: spec.variable_type.clone(),
                arn: Some(arn.clone()),
                created_time: Some(stamp.clone()),
                last_updated_time: Some(stamp),
            },
        );
        state.set_tags_if_new(&arn, &spec.tags);
        state.record("create_variable", &spec.name);
        Ok(())
    }

    async fn update_variable(&self, update: &VariableUpdate) -> RemoteResult<()> {
        let mut state = self.state();
        let variable = state
            .variables
            .get_mut(&update.name)
            .ok_or_else(|| RemoteError::NotFound(format!("variable {}", update.name)))?;
        if let Some(default_value) = &update.default_value {
            variable.default_value = default_value.clone();
        }
        if let Some(description) = &update.description {
            variable.description = Some(description.clone());
        }
        if let Some(variable_type) = &update.variable_type {
            variable.variable_type = Some(variable_type.clone());
        }
        variable.last_updated_time = Some(now());
        state.record("update_variable", &update.name);
        Ok(())
    }

    async fn get_variable(&self, name: &str) -> RemoteResult<VariableRecord> {
        let mut state = self.state();
        state.take_fault("get_variable")?;
        state
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("variable {name}")))
    }

    // ── Event types ────────────────────────────────────────────

    async fn put_event_type(&self, spec: &EventTypeSpec) -> RemoteResult<()> {
        let arn = self.arn(&format!("event-type/{}", spec.name));
        let mut state = self.state();

        if let Some(missing) = spec
            .event_variables
            .iter()
            .find(|v| !state.variables.contains_key(*v))
        {
            return Err(RemoteError::NotFound(format!("variable {missing}")));
        }
        for (kind, names) in [
            (NamedKind::Label, &spec.labels),
            (NamedKind::EntityType, &spec.entity_types),
        ] {
            let known = state.named.get(&kind);
            if let Some(missing) = names
                .iter()
                .find(|n| !known.is_some_and(|m| m.contains_key(*n)))
            {
                return Err(RemoteError::NotFound(format!(
                    "{} {missing}",
                    named_segment(kind)
                )));
            }
        }

        state.record("put_event_type", &spec.name);
        let stamp = now();
        match state.event_types.get_mut(&spec.name) {
            Some(existing) => {
                existing.description = spec.description.clone();
                existing.event_variables = spec.event_variables.clone();
                existing.labels = spec.labels.clone();
                existing.entity_types = spec.entity_types.clone();
                existing.last_updated_time = Some(stamp);
            }
            None => {
                state.event_types.insert(
                    spec.name.clone(),
                    EventTypeRecord {
                        name: spec.name.clone(),
                        description: spec.description.clone(),
                        event_variables: spec.event_variables.clone(),
                        labels: spec.labels.clone(),
                        entity_types: spec.entity_types.clone(),
                        arn: Some(arn.clone()),
                        created_time: Some(stamp.clone()),
                        last_updated_time: Some(stamp),
                    },
                );
                state.set_tags_if_new(&arn, &spec.tags);
            }
        }
        Ok(())
    }

    async fn get_event_type(&self, name: &str) -> RemoteResult<EventTypeRecord> {
        let mut state = self.state();
        state.take_fault("get_event_type")?;
        state
            .event_types
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("event type {name}")))
    }

    async fn delete_resource(&self, kind: ResourceKind, name: &str) -> RemoteResult<()> {
        let operation = format!("delete_{}", kind.arn_segment().replace('-', "_"));
        let mut state = self.state();

        let blocker: Option<String> = match kind {
            ResourceKind::Detector => {
                let has_versions = state.versions.get(name).is_some_and(|v| !v.is_empty());
                let has_rules = state.rules.keys().any(|(d, _)| d == name);
                (has_versions || has_rules).then(|| "it still has versions or rules".to_string())
            }
            ResourceKind::EventType => state
                .detectors
                .values()
                .find(|d| d.event_type_name == name)
                .map(|d| format!("detector {} uses it", d.detector_id)),
            ResourceKind::Variable => state
                .event_types
                .values()
                .find(|e| e.event_variables.iter().any(|v| v == name))
                .map(|e| format!("event type {} uses it", e.name)),
            ResourceKind::Label => state
                .event_types
                .values()
                .find(|e| e.labels.iter().any(|v| v == name))
                .map(|e| format!("event type {} uses it", e.name)),
            ResourceKind::EntityType => state
                .event_types
                .values()
                .find(|e| e.entity_types.iter().any(|v| v == name))
                .map(|e| format!("event type {} uses it", e.name)),
            ResourceKind::Outcome => state
                .rules
                .values()
                .flat_map(|versions| versions.values())
                .find(|r| r.outcomes.iter().any(|o| o == name))
                .map(|r| format!("rule {} uses it", r.rule_ref())),
        };
        if let Some(reason) = blocker {
            return Err(RemoteError::conflict(
                &operation,
                format!("cannot delete {} {name}: {reason}", kind.arn_segment()),
            ));
        }

        let removed_arn = match kind {
            ResourceKind::Detector => state.detectors.remove(name).map(|r| r.arn),
            ResourceKind::EventType => state.event_types.remove(name).map(|r| r.arn),
            ResourceKind::Variable => state.variables.remove(name).map(|r| r.arn),
            ResourceKind::Label => state
                .named
                .get_mut(&NamedKind::Label)
                .and_then(|m| m.remove(name))
                .map(|r| r.arn),
            ResourceKind::EntityType => state
                .named
                .get_mut(&NamedKind::EntityType)
                .and_then(|m| m.remove(name))
                .map(|r| r.arn),
            ResourceKind::Outcome => state
                .named
                .get_mut(&NamedKind::Outcome)
                .and_then(|m| m.remove(name))
                .map(|r| r.arn),
        };

        match removed_arn {
            None => Err(RemoteError::NotFound(format!("{} {name}", kind.arn_segment()))),
            Some(arn) => {
                if let Some(arn) = arn {
                    state.tags.remove(&arn);
                }
                state.record(&operation, name);
                Ok(())
            }
        }
    }

    // ── Models ─────────────────────────────────────────────────

    async fn get_external_model(&self, model_endpoint: &str) -> RemoteResult<ExternalModelRecord> {
        self.state()
            .external_models
            .get(model_endpoint)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("external model {model_endpoint}")))
    }

    async fn get_model_version(&self, key: &ModelVersionKey) -> RemoteResult<ModelVersionRecord> {
        self.state()
            .model_versions
            .iter()
            .find(|m| &m.key == key)
            .cloned()
            .ok_or_else(|| {
                RemoteError::NotFound(format!(
                    "model version {}/{}/{}",
                    key.model_type, key.model_id, key.version_number
                ))
            })
    }

    // ── Tags ───────────────────────────────────────────────────

    async fn list_tags_for_resource(
        &self,
        resource_arn: &str,
        next_token: Option<String>,
    ) -> RemoteResult<Page<Tag>> {
        let tags = self
            .state()
            .tags
            .get(resource_arn)
            .cloned()
            .unwrap_or_default();
        self.paginate(tags, next_token)
    }

    async fn tag_resource(&self, resource_arn: &str, tags: &[Tag]) -> RemoteResult<()> {
        let mut state = self.state();
        let attached = state.tags.entry(resource_arn.to_string()).or_default();
        for tag in tags {
            match attached.iter_mut().find(|t| t.key == tag.key) {
                Some(existing) => existing.value = tag.value.clone(),
                None => attached.push(tag.clone()),
            }
        }
        state.record("tag_resource", resource_arn);
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: &[String]) -> RemoteResult<()> {
        let mut state = self.state();
        if let Some(attached) = state.tags.get_mut(resource_arn) {
            attached.retain(|t| !tag_keys.contains(&t.key));
            if attached.is_empty() {
                state.tags.remove(resource_arn);
            }
        }
        state.record("untag_resource", resource_arn);
        Ok(())
    }
}

impl InMemoryFraudDetector {
    fn rule_record(&self, spec: &RuleSpec, version: u64) -> RuleRecord {
        let stamp = now();
        RuleRecord {
            detector_id: spec.detector_id.clone(),
            rule_id: spec.rule_id.clone(),
            rule_version: version.to_string(),
            description: spec.description.clone(),
            expression: spec.expression.clone(),
            language: spec.language.clone(),
            outcomes: spec.outcomes.clone(),
            arn: Some(self.arn(&format!(
                "rule/{}/{}/{}",
                spec.detector_id, spec.rule_id, version
            ))),
            created_time: Some(stamp.clone()),
            last_updated_time: Some(stamp),
        }
    }
}
