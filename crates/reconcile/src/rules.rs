//! Rule & outcome reconciler.
//!
//! Creates and re-versions rules and their inline outcomes. Nothing is
//! deleted here: superseded rule versions and orphaned outcomes are
//! handed to garbage collection once the detector version no longer
//! cites them.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, info};

use fdsync_core::{Outcome, Rule};
use fdsync_remote::{NamedKind, RuleQuery, RuleRecord, RuleRef, RuleSpec};

use crate::context::Ctx;
use crate::diff::{outcome_names, RulePlan};
use crate::error::{ReconcileError, Result};
use crate::resolver::{put_named, refresh_named};

/// A rule version queued for deletion, with the outcomes it cites.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StaleRuleVersion {
    pub rule: RuleRef,
    pub outcomes: Vec<String>,
}

impl From<RuleRecord> for StaleRuleVersion {
    fn from(record: RuleRecord) -> Self {
        Self {
            rule: record.rule_ref(),
            outcomes: record.outcomes,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct AppliedRules {
    /// The rule version each desired rule now points at, in declaration order.
    pub rules: Vec<RuleRef>,
    pub stale: Vec<StaleRuleVersion>,
    pub outcomes_to_delete: Vec<String>,
}

pub(crate) fn rule_spec(rule: &Rule) -> RuleSpec {
    RuleSpec {
        detector_id: rule.detector_id.clone(),
        rule_id: rule.rule_id.clone(),
        description: rule.description.clone(),
        expression: rule.expression.clone(),
        language: rule.language.clone(),
        outcomes: outcome_names(rule),
        tags: rule.tags.clone().unwrap_or_default(),
    }
}

fn numeric_version(record: &RuleRecord) -> u64 {
    record.rule_version.parse().unwrap_or(0)
}

pub(crate) async fn create_outcomes(ctx: Ctx<'_>, outcomes: &IndexMap<String, Outcome>) -> Result<()> {
    for (name, outcome) in outcomes {
        put_named(ctx, NamedKind::Outcome, name, outcome).await?;
    }
    if !outcomes.is_empty() {
        debug!(count = outcomes.len(), "inline outcomes created");
    }
    Ok(())
}

pub(crate) async fn create_rules(ctx: Ctx<'_>, rules: &[Rule]) -> Result<Vec<RuleRef>> {
    let mut created = Vec::with_capacity(rules.len());
    for rule in rules {
        let rule_ref = ctx.api.create_rule(&rule_spec(rule)).await?;
        debug!(rule = %rule_ref, "rule created");
        created.push(rule_ref);
    }
    Ok(created)
}

/// Apply a rule plan: new outcomes, new rules, then a fresh version of every
/// persisting rule. Every version that existed before is queued as stale.
pub(crate) async fn apply(ctx: Ctx<'_>, detector_id: &str, plan: &RulePlan) -> Result<AppliedRules> {
    create_outcomes(ctx, &plan.outcomes.create).await?;

    let mut current: HashMap<String, RuleRef> = HashMap::new();
    for rule_ref in create_rules(ctx, &plan.create).await? {
        current.insert(rule_ref.rule_id.clone(), rule_ref);
    }

    for (name, outcome) in &plan.outcomes.refresh {
        refresh_named(ctx, NamedKind::Outcome, name, outcome).await?;
    }

    let mut stale = Vec::new();
    for rule in &plan.persist {
        let existing = ctx.rules(&RuleQuery::rule(detector_id, &rule.rule_id)).await?;
        let latest = existing
            .iter()
            .max_by_key(|r| numeric_version(r))
            .map(RuleRecord::rule_ref)
            .ok_or_else(|| ReconcileError::not_found("Rule", rule.rule_id.clone()))?;

        let next = ctx.api.update_rule_version(&latest, &rule_spec(rule)).await?;
        debug!(rule_id = %rule.rule_id, from = %latest.rule_version, to = %next.rule_version, "rule re-versioned");
        current.insert(rule.rule_id.clone(), next);
        stale.extend(existing.into_iter().map(StaleRuleVersion::from));
    }

    for rule_id in &plan.delete {
        let existing = ctx.rules(&RuleQuery::rule(detector_id, rule_id)).await?;
        stale.extend(existing.into_iter().map(StaleRuleVersion::from));
    }

    let mut rules = Vec::with_capacity(plan.order.len());
    for rule_id in &plan.order {
        let rule_ref = current
            .remove(rule_id)
            .ok_or_else(|| ReconcileError::InternalFailure(format!("no version recorded for rule '{rule_id}'")))?;
        rules.push(rule_ref);
    }

    info!(
        detector_id,
        created = plan.create.len(),
        reversioned = plan.persist.len(),
        stale = stale.len(),
        "rules applied"
    );

    Ok(AppliedRules {
        rules,
        stale,
        outcomes_to_delete: plan.outcomes.delete.iter().cloned().collect(),
    })
}
