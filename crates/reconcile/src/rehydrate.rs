//! Model rehydration: rebuild the declarative model from the remote store.
//!
//! The store has no notion of inline vs referenced. The flag is recomputed
//! from a [`ReferenceSet`] taken from the caller's input model; anything not
//! named there is reported inline.

use std::collections::HashSet;

use fdsync_core::{
    Detector, EntityType, EventType, EventVariable, Label, NamedResource, Outcome, Rule,
};
use fdsync_remote::existence::find_detector;
use fdsync_remote::{retry_not_found, NamedKind, NamedRecord, RuleQuery, RuleRecord, RuleRef};

use crate::context::Ctx;
use crate::diff::Child;
use crate::error::{ReconcileError, Result};
use crate::models;
use crate::versions::latest;

/// Names the caller declared as referenced, per sub-resource class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSet {
    event_type: Option<String>,
    entity_types: HashSet<String>,
    labels: HashSet<String>,
    variables: HashSet<String>,
    outcomes: HashSet<String>,
}

fn referenced_names<T: Child>(items: &[T]) -> HashSet<String> {
    items
        .iter()
        .filter(|item| !item.is_inline())
        .filter_map(Child::resolved_name)
        .collect()
}

impl ReferenceSet {
    /// An empty set: every sub-resource reads back as inline.
    pub fn all_inline() -> Self {
        Self::default()
    }

    pub fn from_detector(detector: &Detector) -> Self {
        let event_type = &detector.event_type;
        let inline_outcomes: HashSet<String> = detector
            .rules
            .iter()
            .flat_map(|r| r.outcomes.iter())
            .filter(|o| o.inline)
            .filter_map(Child::resolved_name)
            .collect();
        let outcomes = detector
            .rules
            .iter()
            .flat_map(|r| referenced_names(&r.outcomes))
            .filter(|name| !inline_outcomes.contains(name))
            .collect();

        Self {
            event_type: if event_type.inline {
                None
            } else {
                event_type.resolved_name()
            },
            entity_types: referenced_names(&event_type.entity_types),
            labels: referenced_names(&event_type.labels),
            variables: referenced_names(&event_type.event_variables),
            outcomes,
        }
    }

    pub fn event_type_is_referenced(&self, name: &str) -> bool {
        self.event_type.as_deref() == Some(name)
    }

    pub fn outcome_is_referenced(&self, name: &str) -> bool {
        self.outcomes.contains(name)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ── Sub-resources ─────────────────────────────────────────────

async fn read_named(
    ctx: Ctx<'_>,
    kind: NamedKind,
    name: &str,
    referenced: &HashSet<String>,
) -> Result<NamedResource> {
    let api = ctx.api;
    let record: NamedRecord = retry_not_found(ctx.delay, move || api.get_named(kind, name)).await?;
    if referenced.contains(name) {
        return Ok(NamedResource {
            name: Some(record.name),
            arn: record.arn,
            inline: false,
            ..Default::default()
        });
    }
    Ok(NamedResource {
        tags: ctx.tags_of(record.arn.as_deref()).await?,
        name: Some(record.name),
        arn: record.arn,
        inline: true,
        description: non_empty(record.description),
        created_time: record.created_time,
        last_updated_time: record.last_updated_time,
    })
}

async fn read_variable(ctx: Ctx<'_>, name: &str, refs: &ReferenceSet) -> Result<EventVariable> {
    let api = ctx.api;
    let record = retry_not_found(ctx.delay, move || api.get_variable(name)).await?;
    if refs.variables.contains(name) {
        return Ok(EventVariable {
            name: Some(record.name),
            arn: record.arn,
            inline: false,
            ..Default::default()
        });
    }
    Ok(EventVariable {
        tags: ctx.tags_of(record.arn.as_deref()).await?,
        name: Some(record.name),
        arn: record.arn,
        inline: true,
        description: non_empty(record.description),
        data_source: Some(record.data_source),
        data_type: Some(record.data_type),
        default_value: Some(record.default_value),
        variable_type: non_empty(record.variable_type),
        created_time: record.created_time,
        last_updated_time: record.last_updated_time,
    })
}

async fn read_event_type(ctx: Ctx<'_>, name: &str, refs: &ReferenceSet) -> Result<EventType> {
    let api = ctx.api;
    let record = retry_not_found(ctx.delay, move || api.get_event_type(name)).await?;
    if refs.event_type_is_referenced(name) {
        return Ok(EventType {
            name: Some(record.name),
            arn: record.arn,
            inline: false,
            ..Default::default()
        });
    }

    let mut event_variables = Vec::with_capacity(record.event_variables.len());
    for variable in &record.event_variables {
        event_variables.push(read_variable(ctx, variable, refs).await?);
    }
    let mut labels: Vec<Label> = Vec::with_capacity(record.labels.len());
    for label in &record.labels {
        labels.push(read_named(ctx, NamedKind::Label, label, &refs.labels).await?);
    }
    let mut entity_types: Vec<EntityType> = Vec::with_capacity(record.entity_types.len());
    for entity_type in &record.entity_types {
        entity_types.push(read_named(ctx, NamedKind::EntityType, entity_type, &refs.entity_types).await?);
    }

    Ok(EventType {
        tags: ctx.tags_of(record.arn.as_deref()).await?,
        name: Some(record.name),
        arn: record.arn,
        inline: true,
        description: non_empty(record.description),
        event_variables,
        labels,
        entity_types,
        created_time: record.created_time,
        last_updated_time: record.last_updated_time,
    })
}

async fn read_rule(ctx: Ctx<'_>, rule: &RuleRef, refs: &ReferenceSet) -> Result<Rule> {
    let api = ctx.api;
    let query = RuleQuery::version(rule);
    let query = &query;
    let record: RuleRecord = retry_not_found(ctx.delay, move || api.get_rules(query, None))
        .await?
        .items
        .into_iter()
        .next()
        .ok_or_else(|| ReconcileError::not_found("Rule", rule.to_string()))?;

    let mut outcomes: Vec<Outcome> = Vec::with_capacity(record.outcomes.len());
    for name in &record.outcomes {
        outcomes.push(read_named(ctx, NamedKind::Outcome, name, &refs.outcomes).await?);
    }

    Ok(Rule {
        tags: ctx.tags_of(record.arn.as_deref()).await?,
        rule_id: record.rule_id,
        rule_version: Some(record.rule_version),
        detector_id: record.detector_id,
        expression: record.expression,
        language: record.language,
        outcomes,
        description: non_empty(record.description),
        arn: record.arn,
        created_time: record.created_time,
        last_updated_time: record.last_updated_time,
    })
}

// ── Detector ──────────────────────────────────────────────────

/// Read a detector back, with rules taken from `version` when given and
/// otherwise from the highest-numbered version.
pub(crate) async fn rehydrate(
    ctx: Ctx<'_>,
    detector_id: &str,
    refs: &ReferenceSet,
    version: Option<&str>,
) -> Result<Detector> {
    let record = find_detector(ctx.api, detector_id)
        .await?
        .ok_or_else(|| ReconcileError::not_found("Detector", detector_id))?;

    let mut detector = Detector {
        detector_id: record.detector_id.clone(),
        description: non_empty(record.description.clone()),
        tags: ctx.tags_of(record.arn.as_deref()).await?,
        event_type: read_event_type(ctx, &record.event_type_name, refs).await?,
        arn: record.arn.clone(),
        created_time: record.created_time.clone(),
        last_updated_time: record.last_updated_time.clone(),
        ..Default::default()
    };

    let selected = match version {
        Some(version_id) => Some(version_id.to_string()),
        None => latest(&ctx.versions(detector_id).await?).map(|s| s.detector_version_id.clone()),
    };
    let Some(version_id) = selected else {
        return Ok(detector);
    };

    let api = ctx.api;
    let version_ref = version_id.as_str();
    let dv = retry_not_found(ctx.delay, move || api.get_detector_version(detector_id, version_ref))
        .await
        .map_err(|e| {
            if e.is_not_found() {
                ReconcileError::not_found("DetectorVersion", format!("{detector_id}/{version_id}"))
            } else {
                e.into()
            }
        })?;

    detector.detector_version_id = Some(dv.detector_version_id.clone());
    detector.detector_version_status = Some(dv.status);
    detector.rule_execution_mode = dv.rule_execution_mode;
    detector.associated_models = models::read_back(ctx, &dv).await?;
    for rule in &dv.rules {
        detector.rules.push(read_rule(ctx, rule, refs).await?);
    }
    Ok(detector)
}
