//! Dependency resolver: existence checks and creation of the EventType
//! subtree and of inline outcomes.
//!
//! Validation and application are separate passes. Every check runs
//! before the first mutation so a rejected request leaves no trace.

use tracing::{debug, info};

use fdsync_core::{Detector, NamedResource, Tag};
use fdsync_remote::existence::exists;
use fdsync_remote::{
    retry_not_found, EventTypeSpec, NamedKind, NamedSpec, ResourceKind, VariableSpec,
    VariableUpdate,
};

use crate::context::Ctx;
use crate::diff::{child_names, plan_event_type, plan_rules, EventTypePlan, RulePlan};
use crate::error::{ReconcileError, Result};
use crate::models::{self, ModelBindings};
use crate::rules;

fn tags_of(tags: &Option<Vec<Tag>>) -> Vec<Tag> {
    tags.clone().unwrap_or_default()
}

// ── Validation ────────────────────────────────────────────────

async fn require_absent(ctx: Ctx<'_>, kind: ResourceKind, name: &str) -> Result<()> {
    if exists(ctx.api, kind, name).await? {
        return Err(ReconcileError::already_exists(kind, name));
    }
    Ok(())
}

async fn require_present(ctx: Ctx<'_>, kind: ResourceKind, name: &str) -> Result<()> {
    if !exists(ctx.api, kind, name).await? {
        return Err(ReconcileError::not_found(kind, name));
    }
    Ok(())
}

/// Existence checks for the event type subtree.
///
/// `creating` additionally requires an inline event type to be new.
pub(crate) async fn validate_event_type(ctx: Ctx<'_>, plan: &EventTypePlan, creating: bool) -> Result<()> {
    if !plan.is_inline() {
        return require_present(ctx, ResourceKind::EventType, &plan.name).await;
    }
    if creating {
        require_absent(ctx, ResourceKind::EventType, &plan.name).await?;
    }

    for (name, _) in &plan.entity_types.create {
        require_absent(ctx, ResourceKind::EntityType, name).await?;
    }
    for name in &plan.entity_types.referenced {
        require_present(ctx, ResourceKind::EntityType, name).await?;
    }
    for (name, _) in &plan.labels.create {
        require_absent(ctx, ResourceKind::Label, name).await?;
    }
    for name in &plan.labels.referenced {
        require_present(ctx, ResourceKind::Label, name).await?;
    }
    for (name, _) in &plan.variables.create {
        require_absent(ctx, ResourceKind::Variable, name).await?;
    }
    for name in &plan.variables.referenced {
        require_present(ctx, ResourceKind::Variable, name).await?;
    }
    Ok(())
}

/// New inline outcomes must not exist yet; referenced ones must.
pub(crate) async fn validate_outcomes(ctx: Ctx<'_>, plan: &RulePlan) -> Result<()> {
    for name in plan.outcomes.create.keys() {
        require_absent(ctx, ResourceKind::Outcome, name).await?;
    }
    for name in &plan.outcomes.referenced {
        require_present(ctx, ResourceKind::Outcome, name).await?;
    }
    Ok(())
}

// ── Application ───────────────────────────────────────────────

pub(crate) async fn put_named(ctx: Ctx<'_>, kind: NamedKind, name: &str, item: &NamedResource) -> Result<()> {
    ctx.api
        .put_named(
            kind,
            &NamedSpec {
                name: name.to_string(),
                description: item.description.clone(),
                tags: tags_of(&item.tags),
            },
        )
        .await?;
    Ok(())
}

/// Re-put a persisting inline item and bring its tags in line.
pub(crate) async fn refresh_named(ctx: Ctx<'_>, kind: NamedKind, name: &str, item: &NamedResource) -> Result<()> {
    put_named(ctx, kind, name, item).await?;
    let api = ctx.api;
    let record = retry_not_found(ctx.delay, move || api.get_named(kind, name)).await?;
    ctx.sync_tags(record.arn.as_deref(), item.tags.as_deref()).await
}

/// Create, update and re-put the inline event type subtree.
///
/// Children removed from the desired model are left in place here;
/// they are deleted by garbage collection once nothing lists them.
pub(crate) async fn apply_event_type(ctx: Ctx<'_>, plan: &EventTypePlan) -> Result<()> {
    if !plan.is_inline() {
        debug!(event_type = %plan.name, "event type is referenced, nothing to apply");
        return Ok(());
    }
    let desired = &plan.desired;

    for (name, item) in &plan.entity_types.create {
        put_named(ctx, NamedKind::EntityType, name, item).await?;
    }
    for (name, item) in &plan.labels.create {
        put_named(ctx, NamedKind::Label, name, item).await?;
    }
    for (name, variable) in &plan.variables.create {
        ctx.api
            .create_variable(&VariableSpec {
                name: name.clone(),
                data_type: variable.data_type.clone().unwrap_or_default(),
                data_source: variable.data_source.clone().unwrap_or_default(),
                default_value: variable.default_value.clone().unwrap_or_default(),
                description: variable.description.clone(),
                variable_type: variable.variable_type.clone(),
                tags: tags_of(&variable.tags),
            })
            .await?;
    }

    for (name, item, _) in &plan.entity_types.persist {
        refresh_named(ctx, NamedKind::EntityType, name, item).await?;
    }
    for (name, item, _) in &plan.labels.persist {
        refresh_named(ctx, NamedKind::Label, name, item).await?;
    }
    for (name, variable, previous) in &plan.variables.persist {
        let variable_type = if variable.variable_type != previous.variable_type {
            variable.variable_type.clone()
        } else {
            None
        };
        ctx.api
            .update_variable(&VariableUpdate {
                name: name.clone(),
                default_value: variable.default_value.clone(),
                description: variable.description.clone(),
                variable_type,
            })
            .await?;
        let api = ctx.api;
        let record = retry_not_found(ctx.delay, move || api.get_variable(name)).await?;
        ctx.sync_tags(record.arn.as_deref(), variable.tags.as_deref()).await?;
    }

    ctx.api
        .put_event_type(&EventTypeSpec {
            name: plan.name.clone(),
            description: desired.description.clone(),
            event_variables: child_names(&desired.event_variables),
            labels: child_names(&desired.labels),
            entity_types: child_names(&desired.entity_types),
            tags: tags_of(&desired.tags),
        })
        .await?;
    let api = ctx.api;
    let name = plan.name.as_str();
    let record = retry_not_found(ctx.delay, move || api.get_event_type(name)).await?;
    ctx.sync_tags(record.arn.as_deref(), desired.tags.as_deref()).await?;

    info!(
        event_type = %plan.name,
        created = plan.entity_types.create.len() + plan.labels.create.len() + plan.variables.create.len(),
        refreshed = plan.entity_types.persist.len() + plan.labels.persist.len() + plan.variables.persist.len(),
        "event type applied"
    );
    Ok(())
}

// ── Create path ───────────────────────────────────────────────

/// Everything the create path needs after dependency resolution.
pub(crate) struct Resolved {
    pub event_type: EventTypePlan,
    pub rules: RulePlan,
    pub models: ModelBindings,
}

/// Validate the whole desired graph, then create the inline event type
/// subtree and the inline outcomes. No rule or detector version is created.
pub(crate) async fn resolve_for_create(ctx: Ctx<'_>, detector: &Detector) -> Result<Resolved> {
    let event_type = plan_event_type(&detector.event_type, None)?;
    let rules = plan_rules(&detector.detector_id, &detector.rules, &[])?;

    validate_event_type(ctx, &event_type, true).await?;
    validate_outcomes(ctx, &rules).await?;
    let models = models::validate(ctx, detector.associated_models.as_deref()).await?;

    apply_event_type(ctx, &event_type).await?;
    rules::create_outcomes(ctx, &rules.outcomes.create).await?;

    Ok(Resolved {
        event_type,
        rules,
        models,
    })
}
