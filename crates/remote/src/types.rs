//! Records returned by the remote store and the specs sent to it.
//!
//! These mirror the remote store's shapes, not the declarative model:
//! children are referenced by name and nothing carries an Inline flag.

use serde::{Deserialize, Serialize};

use fdsync_core::{DetectorVersionStatus, ModelVersionKey, RuleExecutionMode, Tag};

// ── Resource kinds ────────────────────────────────────────────

/// Resource classes addressed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Detector,
    EventType,
    Variable,
    Label,
    EntityType,
    Outcome,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Detector => "Detector",
            ResourceKind::EventType => "EventType",
            ResourceKind::Variable => "EventVariable",
            ResourceKind::Label => "Label",
            ResourceKind::EntityType => "EntityType",
            ResourceKind::Outcome => "Outcome",
        }
    }

    /// Path segment used in ARNs for this kind.
    pub fn arn_segment(&self) -> &'static str {
        match self {
            ResourceKind::Detector => "detector",
            ResourceKind::EventType => "event-type",
            ResourceKind::Variable => "variable",
            ResourceKind::Label => "label",
            ResourceKind::EntityType => "entity-type",
            ResourceKind::Outcome => "outcome",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three classes that share the name/description/tags shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKind {
    Label,
    EntityType,
    Outcome,
}

impl From<NamedKind> for ResourceKind {
    fn from(kind: NamedKind) -> Self {
        match kind {
            NamedKind::Label => ResourceKind::Label,
            NamedKind::EntityType => ResourceKind::EntityType,
            NamedKind::Outcome => ResourceKind::Outcome,
        }
    }
}

impl std::fmt::Display for NamedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(ResourceKind::from(*self).as_str())
    }
}

// ── Records ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorRecord {
    pub detector_id: String,
    pub description: Option<String>,
    pub event_type_name: String,
    pub arn: Option<String>,
    pub created_time: Option<String>,
    pub last_updated_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorVersionSummary {
    pub detector_version_id: String,
    pub status: DetectorVersionStatus,
    pub description: Option<String>,
    pub last_updated_time: Option<String>,
}

/// Identity of one rule version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleRef {
    pub detector_id: String,
    pub rule_id: String,
    pub rule_version: String,
}

impl std::fmt::Display for RuleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.detector_id, self.rule_id, self.rule_version)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorVersionRecord {
    pub detector_id: String,
    pub detector_version_id: String,
    pub description: Option<String>,
    pub status: DetectorVersionStatus,
    pub rule_execution_mode: Option<RuleExecutionMode>,
    pub rules: Vec<RuleRef>,
    pub external_model_endpoints: Vec<String>,
    pub model_versions: Vec<ModelVersionKey>,
    pub arn: Option<String>,
    pub created_time: Option<String>,
    pub last_updated_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub detector_id: String,
    pub rule_id: String,
    pub rule_version: String,
    pub description: Option<String>,
    pub expression: String,
    pub language: String,
    pub outcomes: Vec<String>,
    pub arn: Option<String>,
    pub created_time: Option<String>,
    pub last_updated_time: Option<String>,
}

impl RuleRecord {
    pub fn rule_ref(&self) -> RuleRef {
        RuleRef {
            detector_id: self.detector_id.clone(),
            rule_id: self.rule_id.clone(),
            rule_version: self.rule_version.clone(),
        }
    }
}

/// A Label, EntityType or Outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRecord {
    pub name: String,
    pub description: Option<String>,
    pub arn: Option<String>,
    pub created_time: Option<String>,
    pub last_updated_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRecord {
    pub name: String,
    pub data_type: String,
    pub data_source: String,
    pub default_value: String,
    pub description: Option<String>,
    pub variable_type: Option<String>,
    pub arn: Option<String>,
    pub created_time: Option<String>,
    pub last_updated_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTypeRecord {
    pub name: String,
    pub description: Option<String>,
    pub event_variables: Vec<String>,
    pub labels: Vec<String>,
    pub entity_types: Vec<String>,
    pub arn: Option<String>,
    pub created_time: Option<String>,
    pub last_updated_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalModelRecord {
    pub model_endpoint: String,
    pub status: Option<String>,
    pub arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersionRecord {
    pub key: ModelVersionKey,
    pub status: Option<String>,
    pub arn: Option<String>,
}

// ── Specs ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectorSpec {
    pub detector_id: String,
    pub description: Option<String>,
    pub event_type_name: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectorVersionSpec {
    pub detector_id: String,
    pub description: Option<String>,
    pub rules: Vec<RuleRef>,
    pub external_model_endpoints: Vec<String>,
    pub model_versions: Vec<ModelVersionKey>,
    pub rule_execution_mode: Option<RuleExecutionMode>,
    /// Applied on create only; in-place updates carry no tags.
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleSpec {
    pub detector_id: String,
    pub rule_id: String,
    pub description: Option<String>,
    pub expression: String,
    pub language: String,
    pub outcomes: Vec<String>,
    pub tags: Vec<Tag>,
}

/// Filter for `get_rules`; `rule_version` requires `rule_id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleQuery {
    pub detector_id: String,
    pub rule_id: Option<String>,
    pub rule_version: Option<String>,
}

impl RuleQuery {
    pub fn detector(detector_id: impl Into<String>) -> Self {
        Self {
            detector_id: detector_id.into(),
            ..Default::default()
        }
    }

    pub fn rule(detector_id: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self {
            detector_id: detector_id.into(),
            rule_id: Some(rule_id.into()),
            rule_version: None,
        }
    }

    pub fn version(rule: &RuleRef) -> Self {
        Self {
            detector_id: rule.detector_id.clone(),
            rule_id: Some(rule.rule_id.clone()),
            rule_version: Some(rule.rule_version.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamedSpec {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub data_type: String,
    pub data_source: String,
    pub default_value: String,
    pub description: Option<String>,
    pub variable_type: Option<String>,
    pub tags: Vec<Tag>,
}

/// Mutable attributes of an existing variable; `None` leaves a field as is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariableUpdate {
    pub name: String,
    pub default_value: Option<String>,
    pub description: Option<String>,
    pub variable_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventTypeSpec {
    pub name: String,
    pub description: Option<String>,
    pub event_variables: Vec<String>,
    pub labels: Vec<String>,
    pub entity_types: Vec<String>,
    pub tags: Vec<Tag>,
}
