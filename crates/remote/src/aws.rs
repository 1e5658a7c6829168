//! [`FraudDetectorApi`] over the AWS SDK for Amazon Fraud Detector.

use aws_config::BehaviorVersion;
use aws_sdk_frauddetector as fd;
use aws_sdk_frauddetector::error::ProvideErrorMetadata;
use aws_sdk_frauddetector::types as sdk;
use tracing::{debug, info};

use fdsync_core::config::AwsConfig;
use fdsync_core::{DetectorVersionStatus, ModelVersionKey, RuleExecutionMode, Tag};

use crate::api::FraudDetectorApi;
use crate::error::{RemoteError, RemoteResult};
use crate::paging::Page;
use crate::types::*;

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Map an SDK failure onto the remote error taxonomy by service error code.
fn classify<E>(operation: &str, err: E) -> RemoteError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());
    match err.code() {
        Some("ResourceNotFoundException") => RemoteError::NotFound(format!("{operation}: {message}")),
        Some("ConflictException") => RemoteError::conflict(operation, message),
        Some("ValidationException") => RemoteError::validation(operation, message),
        _ => RemoteError::Service {
            operation: operation.to_string(),
            message,
        },
    }
}

fn build_error(what: &str, err: impl std::fmt::Display) -> RemoteError {
    RemoteError::validation(what, err.to_string())
}

fn missing_field(operation: &str, field: &str) -> RemoteError {
    RemoteError::Service {
        operation: operation.to_string(),
        message: format!("response is missing {field}"),
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn sdk_tags(tags: &[Tag]) -> RemoteResult<Option<Vec<sdk::Tag>>> {
    if tags.is_empty() {
        return Ok(None);
    }
    tags.iter()
        .map(|t| {
            sdk::Tag::builder()
                .key(&t.key)
                .value(&t.value)
                .build()
                .map_err(|e| build_error("tag", e))
        })
        .collect::<RemoteResult<Vec<_>>>()
        .map(Some)
}

fn sdk_rule(rule: &RuleRef) -> RemoteResult<sdk::Rule> {
    sdk::Rule::builder()
        .detector_id(&rule.detector_id)
        .rule_id(&rule.rule_id)
        .rule_version(&rule.rule_version)
        .build()
        .map_err(|e| build_error("rule", e))
}

fn sdk_model_version(key: &ModelVersionKey) -> RemoteResult<sdk::ModelVersion> {
    sdk::ModelVersion::builder()
        .model_id(&key.model_id)
        .model_type(sdk::ModelTypeEnum::from(key.model_type.as_str()))
        .model_version_number(&key.version_number)
        .build()
        .map_err(|e| build_error("model version", e))
}

fn status_from(operation: &str, status: Option<&sdk::DetectorVersionStatus>) -> RemoteResult<DetectorVersionStatus> {
    status
        .and_then(|s| DetectorVersionStatus::parse(s.as_str()))
        .ok_or_else(|| missing_field(operation, "a recognised detector version status"))
}

fn mode_to_sdk(mode: Option<RuleExecutionMode>) -> Option<sdk::RuleExecutionMode> {
    mode.map(|m| sdk::RuleExecutionMode::from(m.as_str()))
}

fn version_parts(spec: &DetectorVersionSpec) -> RemoteResult<(Vec<sdk::Rule>, Vec<sdk::ModelVersion>)> {
    let rules = spec.rules.iter().map(sdk_rule).collect::<RemoteResult<Vec<_>>>()?;
    let models = spec
        .model_versions
        .iter()
        .map(sdk_model_version)
        .collect::<RemoteResult<Vec<_>>>()?;
    Ok((rules, models))
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Remote store backed by the Amazon Fraud Detector service.
///
/// Constructed explicitly and shared by the caller; there is no
/// process-wide client cache.
#[derive(Clone)]
pub struct AwsFraudDetector {
    client: fd::Client,
}

impl AwsFraudDetector {
    /// Load SDK configuration for the configured region and optional endpoint override.
    pub async fn new(config: &AwsConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(fd::config::Region::new(config.region.clone()));
        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = loader.load().await;

        info!(
            region = %config.region,
            endpoint = config.endpoint_url.as_deref().unwrap_or("(default)"),
            "AwsFraudDetector initialised"
        );

        Self {
            client: fd::Client::new(&sdk_config),
        }
    }

    pub fn from_client(client: fd::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl FraudDetectorApi for AwsFraudDetector {
    // -----------------------------------------------------------------------
    // Detectors
    // -----------------------------------------------------------------------

    async fn put_detector(&self, spec: &DetectorSpec) -> RemoteResult<()> {
        debug!(detector_id = %spec.detector_id, "put_detector");
        self.client
            .put_detector()
            .detector_id(&spec.detector_id)
            .set_description(spec.description.clone())
            .event_type_name(&spec.event_type_name)
            .set_tags(sdk_tags(&spec.tags)?)
            .send()
            .await
            .map_err(|e| classify("put_detector", e))?;
        Ok(())
    }

    async fn get_detectors(
        &self,
        detector_id: Option<&str>,
        next_token: Option<String>,
    ) -> RemoteResult<Page<DetectorRecord>> {
        debug!(detector_id = detector_id.unwrap_or("(all)"), "get_detectors");
        let out = self
            .client
            .get_detectors()
            .set_detector_id(owned(detector_id))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify("get_detectors", e))?;

        let items = out
            .detectors()
            .iter()
            .map(|d| DetectorRecord {
                detector_id: d.detector_id().unwrap_or_default().to_string(),
                description: owned(d.description()),
                event_type_name: d.event_type_name().unwrap_or_default().to_string(),
                arn: owned(d.arn()),
                created_time: owned(d.created_time()),
                last_updated_time: owned(d.last_updated_time()),
            })
            .collect();
        Ok(Page {
            items,
            next_token: owned(out.next_token()),
        })
    }

    async fn describe_detector(
        &self,
        detector_id: &str,
        next_token: Option<String>,
    ) -> RemoteResult<Page<DetectorVersionSummary>> {
        debug!(detector_id, "describe_detector");
        let out = self
            .client
            .describe_detector()
            .detector_id(detector_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify("describe_detector", e))?;

        let items = out
            .detector_version_summaries()
            .iter()
            .map(|s| {
                Ok(DetectorVersionSummary {
                    detector_version_id: s.detector_version_id().unwrap_or_default().to_string(),
                    status: status_from("describe_detector", s.status())?,
                    description: owned(s.description()),
                    last_updated_time: owned(s.last_updated_time()),
                })
            })
            .collect::<RemoteResult<Vec<_>>>()?;
        Ok(Page {
            items,
            next_token: owned(out.next_token()),
        })
    }

    // -----------------------------------------------------------------------
    // Detector versions
    // -----------------------------------------------------------------------

    async fn create_detector_version(&self, spec: &DetectorVersionSpec) -> RemoteResult<String> {
        debug!(detector_id = %spec.detector_id, rules = spec.rules.len(), "create_detector_version");
        let (rules, models) = version_parts(spec)?;
        let out = self
            .client
            .create_detector_version()
            .detector_id(&spec.detector_id)
            .set_description(spec.description.clone())
            .set_rules(Some(rules))
            .set_external_model_endpoints(non_empty(&spec.external_model_endpoints))
            .set_model_versions((!models.is_empty()).then_some(models))
            .set_rule_execution_mode(mode_to_sdk(spec.rule_execution_mode))
            .set_tags(sdk_tags(&spec.tags)?)
            .send()
            .await
            .map_err(|e| classify("create_detector_version", e))?;

        out.detector_version_id()
            .map(str::to_string)
            .ok_or_else(|| missing_field("create_detector_version", "detectorVersionId"))
    }

    async fn update_detector_version(
        &self,
        detector_version_id: &str,
        spec: &DetectorVersionSpec,
    ) -> RemoteResult<()> {
        debug!(detector_id = %spec.detector_id, detector_version_id, "update_detector_version");
        let (rules, models) = version_parts(spec)?;
        self.client
            .update_detector_version()
            .detector_id(&spec.detector_id)
            .detector_version_id(detector_version_id)
            .set_description(spec.description.clone())
            .set_rules(Some(rules))
            .set_external_model_endpoints(Some(spec.external_model_endpoints.clone()))
            .set_model_versions(Some(models))
            .set_rule_execution_mode(mode_to_sdk(spec.rule_execution_mode))
            .send()
            .await
            .map_err(|e| classify("update_detector_version", e))?;
        Ok(())
    }

    async fn get_detector_version(
        &self,
        detector_id: &str,
        detector_version_id: &str,
    ) -> RemoteResult<DetectorVersionRecord> {
        debug!(detector_id, detector_version_id, "get_detector_version");
        let out = self
            .client
            .get_detector_version()
            .detector_id(detector_id)
            .detector_version_id(detector_version_id)
            .send()
            .await
            .map_err(|e| classify("get_detector_version", e))?;

        Ok(DetectorVersionRecord {
            detector_id: out.detector_id().unwrap_or(detector_id).to_string(),
            detector_version_id: out
                .detector_version_id()
                .unwrap_or(detector_version_id)
                .to_string(),
            description: owned(out.description()),
            status: status_from("get_detector_version", out.status())?,
            rule_execution_mode: out
                .rule_execution_mode()
                .and_then(|m| RuleExecutionMode::parse(m.as_str())),
            rules: out
                .rules()
                .iter()
                .map(|r| RuleRef {
                    detector_id: r.detector_id().to_string(),
                    rule_id: r.rule_id().to_string(),
                    rule_version: r.rule_version().to_string(),
                })
                .collect(),
            external_model_endpoints: out.external_model_endpoints().to_vec(),
            model_versions: out
                .model_versions()
                .iter()
                .map(|m| ModelVersionKey {
                    model_type: m.model_type().as_str().to_string(),
                    model_id: m.model_id().to_string(),
                    version_number: m.model_version_number().to_string(),
                })
                .collect(),
            arn: owned(out.arn()),
            created_time: owned(out.created_time()),
            last_updated_time: owned(out.last_updated_time()),
        })
    }

    async fn update_detector_version_status(
        &self,
        detector_id: &str,
        detector_version_id: &str,
        status: DetectorVersionStatus,
    ) -> RemoteResult<()> {
        debug!(detector_id, detector_version_id, status = %status, "update_detector_version_status");
        self.client
            .update_detector_version_status()
            .detector_id(detector_id)
            .detector_version_id(detector_version_id)
            .status(sdk::DetectorVersionStatus::from(status.as_str()))
            .send()
            .await
            .map_err(|e| classify("update_detector_version_status", e))?;
        Ok(())
    }

    async fn delete_detector_version(
        &self,
        detector_id: &str,
        detector_version_id: &str,
    ) -> RemoteResult<()> {
        debug!(detector_id, detector_version_id, "delete_detector_version");
        self.client
            .delete_detector_version()
            .detector_id(detector_id)
            .detector_version_id(detector_version_id)
            .send()
            .await
            .map_err(|e| classify("delete_detector_version", e))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Rules
    // -----------------------------------------------------------------------

    async fn create_rule(&self, spec: &RuleSpec) -> RemoteResult<RuleRef> {
        debug!(detector_id = %spec.detector_id, rule_id = %spec.rule_id, "create_rule");
        let out = self
            .client
            .create_rule()
            .detector_id(&spec.detector_id)
            .rule_id(&spec.rule_id)
            .set_description(spec.description.clone())
            .expression(&spec.expression)
            .language(sdk::Language::from(spec.language.as_str()))
            .set_outcomes(Some(spec.outcomes.clone()))
            .set_tags(sdk_tags(&spec.tags)?)
            .send()
            .await
            .map_err(|e| classify("create_rule", e))?;

        let rule = out.rule().ok_or_else(|| missing_field("create_rule", "rule"))?;
        Ok(RuleRef {
            detector_id: rule.detector_id().to_string(),
            rule_id: rule.rule_id().to_string(),
            rule_version: rule.rule_version().to_string(),
        })
    }

    async fn update_rule_version(&self, rule: &RuleRef, spec: &RuleSpec) -> RemoteResult<RuleRef> {
        debug!(rule = %rule, "update_rule_version");
        let out = self
            .client
            .update_rule_version()
            .rule(sdk_rule(rule)?)
            .set_description(spec.description.clone())
            .expression(&spec.expression)
            .language(sdk::Language::from(spec.language.as_str()))
            .set_outcomes(Some(spec.outcomes.clone()))
            .set_tags(sdk_tags(&spec.tags)?)
            .send()
            .await
            .map_err(|e| classify("update_rule_version", e))?;

        let updated = out
            .rule()
            .ok_or_else(|| missing_field("update_rule_version", "rule"))?;
        Ok(RuleRef {
            detector_id: updated.detector_id().to_string(),
            rule_id: updated.rule_id().to_string(),
            rule_version: updated.rule_version().to_string(),
        })
    }

    async fn get_rules(
        &self,
        query: &RuleQuery,
        next_token: Option<String>,
    ) -> RemoteResult<Page<RuleRecord>> {
        debug!(detector_id = %query.detector_id, rule_id = ?query.rule_id, "get_rules");
        let out = self
            .client
            .get_rules()
            .detector_id(&query.detector_id)
            .set_rule_id(query.rule_id.clone())
            .set_rule_version(query.rule_version.clone())
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify("get_rules", e))?;

        let items = out
            .rule_details()
            .iter()
            .map(|r| RuleRecord {
                detector_id: r.detector_id().unwrap_or(&query.detector_id).to_string(),
                rule_id: r.rule_id().unwrap_or_default().to_string(),
                rule_version: r.rule_version().unwrap_or_default().to_string(),
                description: owned(r.description()),
                expression: r.expression().unwrap_or_default().to_string(),
                language: r.language().map(|l| l.as_str().to_string()).unwrap_or_default(),
                outcomes: r.outcomes().to_vec(),
                arn: owned(r.arn()),
                created_time: owned(r.created_time()),
                last_updated_time: owned(r.last_updated_time()),
            })
            .collect();
        Ok(Page {
            items,
            next_token: owned(out.next_token()),
        })
    }

    async fn delete_rule(&self, rule: &RuleRef) -> RemoteResult<()> {
        debug!(rule = %rule, "delete_rule");
        self.client
            .delete_rule()
            .rule(sdk_rule(rule)?)
            .send()
            .await
            .map_err(|e| classify("delete_rule", e))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Labels, entity types, outcomes
    // -----------------------------------------------------------------------

    async fn put_named(&self, kind: NamedKind, spec: &NamedSpec) -> RemoteResult<()> {
        debug!(kind = %kind, name = %spec.name, "put_named");
        let tags = sdk_tags(&spec.tags)?;
        match kind {
            NamedKind::Label => {
                self.client
                    .put_label()
                    .name(&spec.name)
                    .set_description(spec.description.clone())
                    .set_tags(tags)
                    .send()
                    .await
                    .map_err(|e| classify("put_label", e))?;
            }
            NamedKind::EntityType => {
                self.client
                    .put_entity_type()
                    .name(&spec.name)
                    .set_description(spec.description.clone())
                    .set_tags(tags)
                    .send()
                    .await
                    .map_err(|e| classify("put_entity_type", e))?;
            }
            NamedKind::Outcome => {
                self.client
                    .put_outcome()
                    .name(&spec.name)
                    .set_description(spec.description.clone())
                    .set_tags(tags)
                    .send()
                    .await
                    .map_err(|e| classify("put_outcome", e))?;
            }
        }
        Ok(())
    }

    async fn get_named(&self, kind: NamedKind, name: &str) -> RemoteResult<NamedRecord> {
        debug!(kind = %kind, name, "get_named");
        let record = match kind {
            NamedKind::Label => {
                let out = self
                    .client
                    .get_labels()
                    .name(name)
                    .send()
                    .await
                    .map_err(|e| classify("get_labels", e))?;
                out.labels().first().map(|l| NamedRecord {
                    name: l.name().unwrap_or(name).to_string(),
                    description: owned(l.description()),
                    arn: owned(l.arn()),
                    created_time: owned(l.created_time()),
                    last_updated_time: owned(l.last_updated_time()),
                })
            }
            NamedKind::EntityType => {
                let out = self
                    .client
                    .get_entity_types()
                    .name(name)
                    .send()
                    .await
                    .map_err(|e| classify("get_entity_types", e))?;
                out.entity_types().first().map(|e| NamedRecord {
                    name: e.name().unwrap_or(name).to_string(),
                    description: owned(e.description()),
                    arn: owned(e.arn()),
                    created_time: owned(e.created_time()),
                    last_updated_time: owned(e.last_updated_time()),
                })
            }
            NamedKind::Outcome => {
                let out = self
                    .client
                    .get_outcomes()
                    .name(name)
                    .send()
                    .await
                    .map_err(|e| classify("get_outcomes", e))?;
                out.outcomes().first().map(|o| NamedRecord {
                    name: o.name().unwrap_or(name).to_string(),
                    description: owned(o.description()),
                    arn: owned(o.arn()),
                    created_time: owned(o.created_time()),
                    last_updated_time: owned(o.last_updated_time()),
                })
            }
        };
        record.ok_or_else(|| RemoteError::NotFound(format!("{kind} {name}")))
    }

    // -----------------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------------

    async fn create_variable(&self, spec: &VariableSpec) -> RemoteResult<()> {
        debug!(name = %spec.name, "create_variable");
        self.client
            .create_variable()
            .name(&spec.name)
            .data_type(sdk::DataType::from(spec.data_type.as_str()))
            .data_source(sdk::DataSource::from(spec.data_source.as_str()))
            .default_value(&spec.default_value)
            .set_description(spec.description.clone())
            .set_variable_type(spec.variable_type.clone())
            .set_tags(sdk_tags(&spec.tags)?)
            .send()
            .await
            .map_err(|e| classify("create_variable", e))?;
        Ok(())
    }

    async fn update_variable(&self, update: &VariableUpdate) -> RemoteResult<()> {
        debug!(name = %update.name, "update_variable");
        self.client
            .update_variable()
            .name(&update.name)
            .set_default_value(update.default_value.clone())
            .set_description(update.description.clone())
            .set_variable_type(update.variable_type.clone())
            .send()
            .await
            .map_err(|e| classify("update_variable", e))?;
        Ok(())
    }

    async fn get_variable(&self, name: &str) -> RemoteResult<VariableRecord> {
        debug!(name, "get_variable");
        let out = self
            .client
            .get_variables()
            .name(name)
            .send()
            .await
            .map_err(|e| classify("get_variables", e))?;

        out.variables()
            .first()
            .map(|v| VariableRecord {
                name: v.name().unwrap_or(name).to_string(),
                data_type: v.data_type().map(|t| t.as_str().to_string()).unwrap_or_default(),
                data_source: v.data_source().map(|s| s.as_str().to_string()).unwrap_or_default(),
                default_value: v.default_value().unwrap_or_default().to_string(),
                description: owned(v.description()),
                variable_type: owned(v.variable_type()),
                arn: owned(v.arn()),
                created_time: owned(v.created_time()),
                last_updated_time: owned(v.last_updated_time()),
            })
            .ok_or_else(|| RemoteError::NotFound(format!("variable {name}")))
    }

    // -----------------------------------------------------------------------
    // Event types
    // -----------------------------------------------------------------------

    async fn put_event_type(&self, spec: &EventTypeSpec) -> RemoteResult<()> {
        debug!(name = %spec.name, "put_event_type");
        self.client
            .put_event_type()
            .name(&spec.name)
            .set_description(spec.description.clone())
            .set_event_variables(Some(spec.event_variables.clone()))
            .set_labels(non_empty(&spec.labels))
            .set_entity_types(Some(spec.entity_types.clone()))
            .set_tags(sdk_tags(&spec.tags)?)
            .send()
            .await
            .map_err(|e| classify("put_event_type", e))?;
        Ok(())
    }

    async fn get_event_type(&self, name: &str) -> RemoteResult<EventTypeRecord> {
        debug!(name, "get_event_type");
        let out = self
            .client
            .get_event_types()
            .name(name)
            .send()
            .await
            .map_err(|e| classify("get_event_types", e))?;

        out.event_types()
            .first()
            .map(|e| EventTypeRecord {
                name: e.name().unwrap_or(name).to_string(),
                description: owned(e.description()),
                event_variables: e.event_variables().to_vec(),
                labels: e.labels().to_vec(),
                entity_types: e.entity_types().to_vec(),
                arn: owned(e.arn()),
                created_time: owned(e.created_time()),
                last_updated_time: owned(e.last_updated_time()),
            })
            .ok_or_else(|| RemoteError::NotFound(format!("event type {name}")))
    }

    async fn delete_resource(&self, kind: ResourceKind, name: &str) -> RemoteResult<()> {
        debug!(kind = %kind, name, "delete_resource");
        match kind {
            ResourceKind::Detector => {
                self.client
                    .delete_detector()
                    .detector_id(name)
                    .send()
                    .await
                    .map_err(|e| classify("delete_detector", e))?;
            }
            ResourceKind::EventType => {
                self.client
                    .delete_event_type()
                    .name(name)
                    .send()
                    .await
                    .map_err(|e| classify("delete_event_type", e))?;
            }
            ResourceKind::Variable => {
                self.client
                    .delete_variable()
                    .name(name)
                    .send()
                    .await
                    .map_err(|e| classify("delete_variable", e))?;
            }
            ResourceKind::Label => {
                self.client
                    .delete_label()
                    .name(name)
                    .send()
                    .await
                    .map_err(|e| classify("delete_label", e))?;
            }
            ResourceKind::EntityType => {
                self.client
                    .delete_entity_type()
                    .name(name)
                    .send()
                    .await
                    .map_err(|e| classify("delete_entity_type", e))?;
            }
            ResourceKind::Outcome => {
                self.client
                    .delete_outcome()
                    .name(name)
                    .send()
                    .await
                    .map_err(|e| classify("delete_outcome", e))?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Models
    // -----------------------------------------------------------------------

    async fn get_external_model(&self, model_endpoint: &str) -> RemoteResult<ExternalModelRecord> {
        debug!(model_endpoint, "get_external_model");
        let out = self
            .client
            .get_external_models()
            .model_endpoint(model_endpoint)
            .send()
            .await
            .map_err(|e| classify("get_external_models", e))?;

        out.external_models()
            .first()
            .map(|m| ExternalModelRecord {
                model_endpoint: m.model_endpoint().unwrap_or(model_endpoint).to_string(),
                status: m.model_endpoint_status().map(|s| s.as_str().to_string()),
                arn: owned(m.arn()),
            })
            .ok_or_else(|| RemoteError::NotFound(format!("external model {model_endpoint}")))
    }

    async fn get_model_version(&self, key: &ModelVersionKey) -> RemoteResult<ModelVersionRecord> {
        debug!(model_id = %key.model_id, version = %key.version_number, "get_model_version");
        let out = self
            .client
            .get_model_version()
            .model_id(&key.model_id)
            .model_type(sdk::ModelTypeEnum::from(key.model_type.as_str()))
            .model_version_number(&key.version_number)
            .send()
            .await
            .map_err(|e| classify("get_model_version", e))?;

        Ok(ModelVersionRecord {
            key: key.clone(),
            status: owned(out.status()),
            arn: owned(out.arn()),
        })
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    async fn list_tags_for_resource(
        &self,
        resource_arn: &str,
        next_token: Option<String>,
    ) -> RemoteResult<Page<Tag>> {
        debug!(resource_arn, "list_tags_for_resource");
        let out = self
            .client
            .list_tags_for_resource()
            .resource_arn(resource_arn)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify("list_tags_for_resource", e))?;

        Ok(Page {
            items: out
                .tags()
                .iter()
                .map(|t| Tag::new(t.key(), t.value()))
                .collect(),
            next_token: owned(out.next_token()),
        })
    }

    async fn tag_resource(&self, resource_arn: &str, tags: &[Tag]) -> RemoteResult<()> {
        debug!(resource_arn, count = tags.len(), "tag_resource");
        self.client
            .tag_resource()
            .resource_arn(resource_arn)
            .set_tags(sdk_tags(tags)?)
            .send()
            .await
            .map_err(|e| classify("tag_resource", e))?;
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: &[String]) -> RemoteResult<()> {
        debug!(resource_arn, count = tag_keys.len(), "untag_resource");
        self.client
            .untag_resource()
            .resource_arn(resource_arn)
            .set_tag_keys(Some(tag_keys.to_vec()))
            .send()
            .await
            .map_err(|e| classify("untag_resource", e))?;
        Ok(())
    }
}
