//! Associated model references: external model endpoints and model versions.

use tracing::debug;

use fdsync_core::{
    extract_name_from_arn, is_external_model_arn, parse_model_version_arn, AssociatedModel,
    ModelVersionKey,
};
use fdsync_remote::existence::{find_external_model, find_model_version};
use fdsync_remote::DetectorVersionRecord;

use crate::context::Ctx;
use crate::error::{ReconcileError, Result};

const ACTIVE_MODEL_STATUS: &str = "ACTIVE";

/// What a detector version binds to, split by model kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ModelBindings {
    pub external_model_endpoints: Vec<String>,
    pub model_versions: Vec<ModelVersionKey>,
}

enum ModelRef {
    External(String),
    Version(ModelVersionKey),
}

fn classify(arn: &str) -> Result<ModelRef> {
    if is_external_model_arn(arn) {
        return Ok(ModelRef::External(extract_name_from_arn(arn).to_string()));
    }
    parse_model_version_arn(arn)
        .map(ModelRef::Version)
        .ok_or_else(|| {
            ReconcileError::invalid(format!("Unexpected ARN provided in AssociatedModels: {arn}"))
        })
}

/// Check every associated model exists, and that model versions are ACTIVE.
pub(crate) async fn validate(ctx: Ctx<'_>, models: Option<&[AssociatedModel]>) -> Result<ModelBindings> {
    let mut bindings = ModelBindings::default();
    for model in models.unwrap_or_default() {
        match classify(&model.arn)? {
            ModelRef::External(endpoint) => {
                if find_external_model(ctx.api, &endpoint).await?.is_none() {
                    return Err(ReconcileError::not_found("ExternalModel", model.arn.clone()));
                }
                bindings.external_model_endpoints.push(endpoint);
            }
            ModelRef::Version(key) => {
                let record = find_model_version(ctx.api, &key)
                    .await?
                    .ok_or_else(|| ReconcileError::not_found("ModelVersion", model.arn.clone()))?;
                if record.status.as_deref() != Some(ACTIVE_MODEL_STATUS) {
                    return Err(ReconcileError::invalid(format!(
                        "Specified model must be in status:ACTIVE, ModelVersion arn='{}'",
                        model.arn
                    )));
                }
                bindings.model_versions.push(key);
            }
        }
    }
    debug!(
        external = bindings.external_model_endpoints.len(),
        versions = bindings.model_versions.len(),
        "associated models validated"
    );
    Ok(bindings)
}

/// Rebuild `AssociatedModels` from a detector version; `None` when it has none.
pub(crate) async fn read_back(ctx: Ctx<'_>, version: &DetectorVersionRecord) -> Result<Option<Vec<AssociatedModel>>> {
    let mut models = Vec::new();
    for endpoint in &version.external_model_endpoints {
        if let Some(arn) = find_external_model(ctx.api, endpoint).await?.and_then(|m| m.arn) {
            models.push(AssociatedModel { arn });
        }
    }
    for key in &version.model_versions {
        if let Some(arn) = find_model_version(ctx.api, key).await?.and_then(|m| m.arn) {
            models.push(AssociatedModel { arn });
        }
    }
    Ok((!models.is_empty()).then_some(models))
}
