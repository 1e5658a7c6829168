//! Name and ARN helpers shared by the remote adapters and the reconciler.

use serde::{Deserialize, Serialize};

/// Marker that distinguishes an external model endpoint ARN.
const EXTERNAL_MODEL_MARKER: &str = "external-model/";

/// Marker that precedes the model-version path of a model version ARN.
const MODEL_VERSION_MARKER: &str = "model-version/";

/// Last `/`-separated segment of an ARN; the whole input when it has none.
pub fn extract_name_from_arn(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

pub fn is_external_model_arn(arn: &str) -> bool {
    arn.contains(EXTERNAL_MODEL_MARKER)
}

/// Identity of a model version, parsed from
/// `arn:...:model-version/{model_type}/{model_id}/{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelVersionKey {
    pub model_type: String,
    pub model_id: String,
    pub version_number: String,
}

pub fn parse_model_version_arn(arn: &str) -> Option<ModelVersionKey> {
    let (_, path) = arn.split_once(MODEL_VERSION_MARKER)?;
    let mut parts = path.split('/');
    let model_type = parts.next().filter(|s| !s.is_empty())?;
    let model_id = parts.next().filter(|s| !s.is_empty())?;
    let version_number = parts.next().filter(|s| !s.is_empty())?;
    if parts.next().is_some() {
        return None;
    }
    Some(ModelVersionKey {
        model_type: model_type.to_string(),
        model_id: model_id.to_string(),
        version_number: version_number.to_string(),
    })
}

/// Resolve the effective name of a sub-resource.
///
/// Inline items are named by `name`. Referenced items are named by the
/// last ARN segment, falling back to `name` when no ARN was given.
pub fn resolve_name(inline: bool, name: Option<&str>, arn: Option<&str>) -> Option<String> {
    if inline {
        return name.filter(|n| !n.is_empty()).map(str::to_string);
    }
    match arn.filter(|a| !a.is_empty()) {
        Some(arn) => Some(extract_name_from_arn(arn).to_string()),
        None => name.filter(|n| !n.is_empty()).map(str::to_string),
    }
}
