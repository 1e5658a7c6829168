//! DetectorVersion lifecycle.
//!
//! A DRAFT version is rewritten in place; any other status gets a brand-new
//! DRAFT version. After the write the remaining versions are partitioned:
//! the one just written and the live ACTIVE one survive, everything else is
//! superseded. Activation is issued last.

use tracing::{debug, info};

use fdsync_core::{Detector, DetectorVersionStatus, Tag};
use fdsync_remote::{DetectorVersionSpec, DetectorVersionSummary, RuleRef};

use crate::context::Ctx;
use crate::error::Result;
use crate::models::ModelBindings;

/// The version a detector currently points at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CurrentVersion {
    pub id: String,
    pub status: DetectorVersionStatus,
    pub arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VersionOutcome {
    pub written: String,
    pub superseded: Vec<String>,
}

pub(crate) fn version_spec(detector: &Detector, rules: Vec<RuleRef>, models: &ModelBindings) -> DetectorVersionSpec {
    DetectorVersionSpec {
        detector_id: detector.detector_id.clone(),
        description: detector.description.clone(),
        rules,
        external_model_endpoints: models.external_model_endpoints.clone(),
        model_versions: models.model_versions.clone(),
        rule_execution_mode: detector.rule_execution_mode,
        tags: detector.tags.clone().unwrap_or_default(),
    }
}

/// Versions to retire: neither the one just written nor currently ACTIVE.
pub(crate) fn superseded(summaries: &[DetectorVersionSummary], written: &str) -> Vec<String> {
    summaries
        .iter()
        .filter(|s| s.detector_version_id != written && s.status != DetectorVersionStatus::Active)
        .map(|s| s.detector_version_id.clone())
        .collect()
}

/// The highest numeric version id, if any.
pub(crate) fn latest(summaries: &[DetectorVersionSummary]) -> Option<&DetectorVersionSummary> {
    summaries
        .iter()
        .max_by_key(|s| s.detector_version_id.parse::<u64>().unwrap_or(0))
}

async fn activate(ctx: Ctx<'_>, detector_id: &str, version_id: &str, status: DetectorVersionStatus) -> Result<()> {
    if status == DetectorVersionStatus::Draft {
        return Ok(());
    }
    ctx.api
        .update_detector_version_status(detector_id, version_id, status)
        .await?;
    info!(detector_id, version_id, status = %status, "detector version status set");
    Ok(())
}

/// First version of a new detector.
pub(crate) async fn create_initial(
    ctx: Ctx<'_>,
    spec: &DetectorVersionSpec,
    status: DetectorVersionStatus,
) -> Result<String> {
    let version_id = ctx.api.create_detector_version(spec).await?;
    info!(detector_id = %spec.detector_id, version_id = %version_id, "detector version created");
    activate(ctx, &spec.detector_id, &version_id, status).await?;
    Ok(version_id)
}

/// Write the reconciled version and work out which versions it supersedes.
pub(crate) async fn reconcile(
    ctx: Ctx<'_>,
    spec: &DetectorVersionSpec,
    current: Option<&CurrentVersion>,
    tags: Option<&[Tag]>,
    status: DetectorVersionStatus,
) -> Result<VersionOutcome> {
    let detector_id = spec.detector_id.as_str();

    let written = match current {
        Some(current) if current.status == DetectorVersionStatus::Draft => {
            ctx.api.update_detector_version(&current.id, spec).await?;
            ctx.sync_tags(current.arn.as_deref(), tags).await?;
            info!(detector_id, version_id = %current.id, "draft detector version updated in place");
            current.id.clone()
        }
        _ => {
            let version_id = ctx.api.create_detector_version(spec).await?;
            info!(detector_id, version_id = %version_id, "detector version created");
            version_id
        }
    };

    let summaries = ctx.versions(detector_id).await?;
    let superseded = superseded(&summaries, &written);
    debug!(detector_id, written = %written, superseded = ?superseded, "detector versions partitioned");

    activate(ctx, detector_id, &written, status).await?;

    Ok(VersionOutcome { written, superseded })
}
