//! Entry points: create, update, delete, read and list a detector.
//!
//! Each call is one sequential pipeline against the remote store. Checks
//! that can reject a request run before the first mutation. Once mutation
//! starts, a failure surfaces immediately and nothing is rolled back.

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, info, warn};

use fdsync_core::config::RemoteTuning;
use fdsync_core::{Detector, DetectorVersionStatus};
use fdsync_remote::existence::{find_detector, found};
use fdsync_remote::{DetectorRecord, DetectorSpec, FraudDetectorApi, ResourceKind, RuleQuery};

use crate::context::Ctx;
use crate::diff::{child_names, plan_event_type, plan_rules, Child};
use crate::error::{ReconcileError, Result};
use crate::gc::{self, Garbage, SweepReport};
use crate::models;
use crate::rehydrate::{rehydrate, ReferenceSet};
use crate::resolver::{apply_event_type, resolve_for_create, validate_event_type, validate_outcomes};
use crate::rules;
use crate::versions::{self, latest, version_spec, CurrentVersion};

/// Result of an update, with what the version lifecycle and the sweep did.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub model: Detector,
    /// Id of the detector version the update wrote.
    pub written_version: String,
    pub sweep: SweepReport,
}

/// Reconciles detector models against a fraud-detection store.
pub struct DetectorReconciler {
    api: Arc<dyn FraudDetectorApi>,
    tuning: RemoteTuning,
}

impl DetectorReconciler {
    pub fn new(api: Arc<dyn FraudDetectorApi>, tuning: RemoteTuning) -> Self {
        Self { api, tuning }
    }

    fn ctx(&self) -> Ctx<'_> {
        Ctx::new(self.api.as_ref(), &self.tuning)
    }

    async fn require_detector(&self, detector_id: &str) -> Result<DetectorRecord> {
        find_detector(self.api.as_ref(), detector_id)
            .await?
            .ok_or_else(|| ReconcileError::not_found("Detector", detector_id))
    }

    // ── Create ─────────────────────────────────────────────────

    /// Create a detector and its whole inline graph.
    pub async fn create(&self, desired: &Detector) -> Result<Detector> {
        let ctx = self.ctx();
        let detector_id = desired.detector_id.as_str();
        if detector_id.is_empty() {
            return Err(ReconcileError::invalid("DetectorId is required"));
        }
        if find_detector(ctx.api, detector_id).await?.is_some() {
            return Err(ReconcileError::already_exists("Detector", detector_id));
        }
        if desired.has_read_only_properties() {
            return Err(ReconcileError::invalid("cannot create read-only properties"));
        }

        let resolved = resolve_for_create(ctx, desired).await?;
        info!(detector_id, event_type = %resolved.event_type.name, "dependencies resolved");

        ctx.api
            .put_detector(&DetectorSpec {
                detector_id: detector_id.to_string(),
                description: desired.description.clone(),
                event_type_name: resolved.event_type.name.clone(),
                tags: desired.tags.clone().unwrap_or_default(),
            })
            .await?;

        let rule_refs = rules::create_rules(ctx, &resolved.rules.create).await?;
        info!(detector_id, rules = rule_refs.len(), "rules created");

        let spec = version_spec(desired, rule_refs, &resolved.models);
        let version_id = versions::create_initial(ctx, &spec, desired.desired_status()).await?;

        info!(detector_id, version_id = %version_id, "detector created");
        rehydrate(ctx, detector_id, &ReferenceSet::from_detector(desired), Some(&version_id)).await
    }

    // ── Update ─────────────────────────────────────────────────

    /// Move the detector from `previous` to `desired`.
    pub async fn update(&self, desired: &Detector, previous: &Detector) -> Result<Detector> {
        Ok(self.update_with_report(desired, previous).await?.model)
    }

    pub async fn update_with_report(&self, desired: &Detector, previous: &Detector) -> Result<UpdateReport> {
        let ctx = self.ctx();
        if desired.detector_id != previous.detector_id {
            return Err(ReconcileError::NotUpdatable(format!(
                "DetectorId cannot change from '{}' to '{}'",
                previous.detector_id, desired.detector_id
            )));
        }
        let detector_id = desired.detector_id.as_str();
        let record = self.require_detector(detector_id).await?;

        let event_type = plan_event_type(&desired.event_type, Some(&previous.event_type))?;
        let rule_plan = plan_rules(detector_id, &desired.rules, &previous.rules)?;
        validate_event_type(ctx, &event_type, false).await?;
        validate_outcomes(ctx, &rule_plan).await?;
        let models = models::validate(ctx, desired.associated_models.as_deref()).await?;
        let current = current_version(ctx, detector_id, previous.detector_version_id.as_deref()).await?;
        info!(
            detector_id,
            current_version = ?current.as_ref().map(|c| &c.id),
            "update validated"
        );

        apply_event_type(ctx, &event_type).await?;
        let applied = rules::apply(ctx, detector_id, &rule_plan).await?;

        let spec = version_spec(desired, applied.rules, &models);
        let outcome = versions::reconcile(
            ctx,
            &spec,
            current.as_ref(),
            desired.tags.as_deref(),
            desired.desired_status(),
        )
        .await?;

        let sweep = gc::sweep(
            ctx,
            detector_id,
            Garbage {
                versions: outcome.superseded,
                rule_versions: applied.stale,
                outcomes: applied.outcomes_to_delete,
                entity_types: event_type.entity_types.delete.clone(),
                labels: event_type.labels.delete.clone(),
            },
        )
        .await?;

        ctx.api
            .put_detector(&DetectorSpec {
                detector_id: detector_id.to_string(),
                description: desired.description.clone(),
                event_type_name: event_type.name.clone(),
                tags: desired.tags.clone().unwrap_or_default(),
            })
            .await?;
        ctx.sync_tags(record.arn.as_deref(), desired.tags.as_deref()).await?;
        info!(detector_id, version_id = %outcome.written, "detector updated");

        let model = rehydrate(
            ctx,
            detector_id,
            &ReferenceSet::from_detector(desired),
            Some(&outcome.written),
        )
        .await?;
        Ok(UpdateReport {
            model,
            written_version: outcome.written,
            sweep,
        })
    }

    // ── Delete ─────────────────────────────────────────────────

    /// Delete the detector, every version and rule it owns, and its inline
    /// dependencies. Referenced resources are left untouched.
    pub async fn delete(&self, model: &Detector) -> Result<()> {
        let ctx = self.ctx();
        let detector_id = model
            .resolved_id()
            .ok_or_else(|| ReconcileError::invalid("DetectorId or Arn is required"))?;
        self.require_detector(detector_id).await?;

        for summary in ctx.versions(detector_id).await? {
            let version_id = summary.detector_version_id.as_str();
            if summary.status == DetectorVersionStatus::Active {
                ctx.api
                    .update_detector_version_status(detector_id, version_id, DetectorVersionStatus::Inactive)
                    .await?;
            }
            ctx.api.delete_detector_version(detector_id, version_id).await?;
            debug!(detector_id, version_id, "detector version deleted");
        }

        let rule_versions = ctx.rules(&RuleQuery::detector(detector_id)).await?;
        for rule in &rule_versions {
            ctx.api.delete_rule(&rule.rule_ref()).await?;
        }

        let inline_outcomes: IndexSet<String> = model
            .rules
            .iter()
            .flat_map(|r| r.outcomes.iter())
            .filter(|o| o.inline)
            .filter_map(Child::resolved_name)
            .collect();
        for name in &inline_outcomes {
            ctx.api.delete_resource(ResourceKind::Outcome, name).await?;
        }

        // Outcomes only earlier rule versions cite, such as ones kept by a
        // sweep because a live version still used them.
        let refs = ReferenceSet::from_detector(model);
        let historic: IndexSet<&str> = rule_versions
            .iter()
            .flat_map(|r| r.outcomes.iter().map(String::as_str))
            .filter(|name| !inline_outcomes.contains(*name) && !refs.outcome_is_referenced(name))
            .collect();
        for name in &historic {
            match ctx.api.delete_resource(ResourceKind::Outcome, name).await {
                Ok(()) => debug!(detector_id, outcome = %name, "outcome of an earlier rule version deleted"),
                Err(e) if e.is_not_found() || e.is_conflict() => {
                    warn!(detector_id, outcome = %name, error = %e, "outcome of an earlier rule version left in place");
                }
                Err(e) => return Err(e.into()),
            }
        }

        ctx.api.delete_resource(ResourceKind::Detector, detector_id).await?;

        let event_type = &model.event_type;
        if event_type.inline {
            if let Some(name) = event_type.resolved_name() {
                ctx.api.delete_resource(ResourceKind::EventType, &name).await?;
            }
            for (kind, names) in [
                (ResourceKind::Variable, inline_child_names(&event_type.event_variables)),
                (ResourceKind::EntityType, inline_child_names(&event_type.entity_types)),
                (ResourceKind::Label, inline_child_names(&event_type.labels)),
            ] {
                for name in &names {
                    ctx.api.delete_resource(kind, name).await?;
                }
            }
        }

        info!(
            detector_id,
            rule_versions = rule_versions.len(),
            outcomes = inline_outcomes.len() + historic.len(),
            "detector deleted"
        );
        Ok(())
    }

    // ── Read / List ────────────────────────────────────────────

    /// Rehydrate the detector named by `model`'s id or ARN.
    pub async fn read(&self, model: &Detector) -> Result<Detector> {
        let detector_id = model
            .resolved_id()
            .ok_or_else(|| ReconcileError::invalid("DetectorId or Arn is required"))?;
        rehydrate(
            self.ctx(),
            detector_id,
            &ReferenceSet::from_detector(model),
            model.detector_version_id.as_deref(),
        )
        .await
    }

    /// Every detector in the store, with all sub-resources reported inline.
    pub async fn list(&self) -> Result<Vec<Detector>> {
        let ctx = self.ctx();
        let refs = ReferenceSet::all_inline();
        let records = ctx.detectors().await?;
        let mut detectors = Vec::with_capacity(records.len());
        for record in &records {
            detectors.push(rehydrate(ctx, &record.detector_id, &refs, None).await?);
        }
        debug!(count = detectors.len(), "detectors listed");
        Ok(detectors)
    }
}

fn inline_child_names<T: Child>(items: &[T]) -> Vec<String> {
    let inline: Vec<T> = items.iter().filter(|item| item.is_inline()).cloned().collect();
    child_names(&inline)
}

/// The version the previous model points at, else the newest one.
async fn current_version(
    ctx: Ctx<'_>,
    detector_id: &str,
    declared: Option<&str>,
) -> Result<Option<CurrentVersion>> {
    let version_id = match declared {
        Some(id) => id.to_string(),
        None => match latest(&ctx.versions(detector_id).await?) {
            Some(summary) => summary.detector_version_id.clone(),
            None => return Ok(None),
        },
    };
    let record = found(ctx.api.get_detector_version(detector_id, &version_id).await)?
        .ok_or_else(|| ReconcileError::not_found("DetectorVersion", format!("{detector_id}/{version_id}")))?;
    Ok(Some(CurrentVersion {
        id: record.detector_version_id,
        status: record.status,
        arn: record.arn,
    }))
}
