//! Orphan garbage collection after an update.
//!
//! Sweeps run in dependency order: detector versions, rule versions,
//! outcomes, then removed event type children. A rule version that a
//! retained detector version still cites is kept with a warning; every
//! other failure is fatal.

use std::collections::HashSet;

use tracing::{info, warn};

use fdsync_remote::{ResourceKind, RuleRef};

use crate::context::Ctx;
use crate::error::Result;
use crate::rules::StaleRuleVersion;

#[derive(Debug, Default)]
pub(crate) struct Garbage {
    pub versions: Vec<String>,
    pub rule_versions: Vec<StaleRuleVersion>,
    pub outcomes: Vec<String>,
    pub entity_types: Vec<String>,
    pub labels: Vec<String>,
}

/// What a sweep removed and what it had to leave behind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepReport {
    pub versions_deleted: Vec<String>,
    pub rule_versions_deleted: Vec<RuleRef>,
    pub rule_versions_retained: Vec<RuleRef>,
    pub outcomes_deleted: Vec<String>,
    pub outcomes_retained: Vec<String>,
}

pub(crate) async fn sweep(ctx: Ctx<'_>, detector_id: &str, garbage: Garbage) -> Result<SweepReport> {
    let mut report = SweepReport::default();

    for version_id in garbage.versions {
        ctx.api.delete_detector_version(detector_id, &version_id).await?;
        report.versions_deleted.push(version_id);
    }

    let mut still_cited: HashSet<String> = HashSet::new();
    for stale in garbage.rule_versions {
        match ctx.api.delete_rule(&stale.rule).await {
            Ok(()) => report.rule_versions_deleted.push(stale.rule),
            Err(e) if e.is_conflict() => {
                warn!(detector_id, rule = %stale.rule, error = %e, "rule version still in use, keeping it");
                still_cited.extend(stale.outcomes);
                report.rule_versions_retained.push(stale.rule);
            }
            Err(e) => return Err(e.into()),
        }
    }

    for name in garbage.outcomes {
        if still_cited.contains(&name) {
            warn!(detector_id, outcome = %name, "outcome cited by a retained rule version, keeping it");
            report.outcomes_retained.push(name);
            continue;
        }
        ctx.api.delete_resource(ResourceKind::Outcome, &name).await?;
        report.outcomes_deleted.push(name);
    }

    for name in &garbage.entity_types {
        ctx.api.delete_resource(ResourceKind::EntityType, name).await?;
    }
    for name in &garbage.labels {
        ctx.api.delete_resource(ResourceKind::Label, name).await?;
    }

    info!(
        detector_id,
        versions = report.versions_deleted.len(),
        rule_versions = report.rule_versions_deleted.len(),
        rule_versions_retained = report.rule_versions_retained.len(),
        outcomes = report.outcomes_deleted.len(),
        "orphans collected"
    );
    Ok(report)
}
