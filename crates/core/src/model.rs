//! Declarative resource model for a Detector and its sub-resources.
//!
//! Field names serialize in PascalCase. Optional fields are `Option<T>`
//! and are omitted entirely when `None`, so "unset" and "empty" stay
//! distinct states.

use serde::{Deserialize, Serialize};

use crate::names::extract_name_from_arn;

// ── Enums ─────────────────────────────────────────────────────

/// Lifecycle status of a DetectorVersion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectorVersionStatus {
    Draft,
    Active,
    Inactive,
}

impl DetectorVersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorVersionStatus::Draft => "DRAFT",
            DetectorVersionStatus::Active => "ACTIVE",
            DetectorVersionStatus::Inactive => "INACTIVE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DRAFT" => Some(DetectorVersionStatus::Draft),
            "ACTIVE" => Some(DetectorVersionStatus::Active),
            "INACTIVE" => Some(DetectorVersionStatus::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for DetectorVersionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a DetectorVersion evaluates its rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleExecutionMode {
    AllMatched,
    FirstMatched,
}

impl RuleExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleExecutionMode::AllMatched => "ALL_MATCHED",
            RuleExecutionMode::FirstMatched => "FIRST_MATCHED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ALL_MATCHED" => Some(RuleExecutionMode::AllMatched),
            "FIRST_MATCHED" => Some(RuleExecutionMode::FirstMatched),
            _ => None,
        }
    }
}

impl std::fmt::Display for RuleExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Tags ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// ── Sub-resources ─────────────────────────────────────────────

/// Shared shape of Labels, EntityTypes and Outcomes.
///
/// `inline == true` means the parent owns the lifecycle; otherwise the
/// item pre-exists and is only checked for existence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamedResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default)]
    pub inline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_time: Option<String>,
}

pub type Label = NamedResource;
pub type EntityType = NamedResource;
pub type Outcome = NamedResource;

impl NamedResource {
    /// An inline item owned by its parent.
    pub fn inline(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            inline: true,
            ..Default::default()
        }
    }

    /// A pre-existing item identified by its ARN.
    pub fn referenced(arn: impl Into<String>) -> Self {
        Self {
            arn: Some(arn.into()),
            inline: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventVariable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default)]
    pub inline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_time: Option<String>,
}

impl EventVariable {
    pub fn inline(
        name: impl Into<String>,
        data_source: impl Into<String>,
        data_type: impl Into<String>,
        default_value: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            inline: true,
            data_source: Some(data_source.into()),
            data_type: Some(data_type.into()),
            default_value: Some(default_value.into()),
            ..Default::default()
        }
    }

    pub fn referenced(arn: impl Into<String>) -> Self {
        Self {
            arn: Some(arn.into()),
            inline: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default)]
    pub inline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_variables: Vec<EventVariable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_types: Vec<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Rule {
    pub rule_id: String,
    /// Assigned by the remote store; read-only on input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_version: Option<String>,
    pub detector_id: String,
    pub expression: String,
    pub language: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_time: Option<String>,
}

/// Reference to an external model endpoint or a model version, by ARN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssociatedModel {
    pub arn: String,
}

// ── Detector (root) ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Detector {
    /// Create-only; changing it on update is rejected.
    #[serde(default)]
    pub detector_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector_version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector_version_status: Option<DetectorVersionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_execution_mode: Option<RuleExecutionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_models: Option<Vec<AssociatedModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_time: Option<String>,
}

impl Detector {
    /// Identifier to act on: `DetectorId` when set, else the last ARN segment.
    pub fn resolved_id(&self) -> Option<&str> {
        if !self.detector_id.is_empty() {
            return Some(&self.detector_id);
        }
        self.arn.as_deref().map(extract_name_from_arn)
    }

    /// Desired activation status, defaulting to DRAFT.
    pub fn desired_status(&self) -> DetectorVersionStatus {
        self.detector_version_status
            .unwrap_or(DetectorVersionStatus::Draft)
    }

    /// True when any read-only attribute is populated.
    pub fn has_read_only_properties(&self) -> bool {
        self.arn.is_some() || self.created_time.is_some() || self.last_updated_time.is_some()
    }
}
