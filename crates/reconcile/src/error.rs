use fdsync_remote::RemoteError;

/// Failures surfaced by a reconciliation.
///
/// Validation-phase kinds are raised before any remote mutation.
/// `InternalFailure` wraps a remote error from a step with no recovery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: String, name: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not updatable: {0}")]
    NotUpdatable(String),

    #[error("Internal failure: {0}")]
    InternalFailure(String),
}

impl ReconcileError {
    pub fn not_found(kind: impl std::fmt::Display, name: impl Into<String>) -> Self {
        ReconcileError::NotFound {
            kind: kind.to_string(),
            name: name.into(),
        }
    }

    pub fn already_exists(kind: impl std::fmt::Display, name: impl Into<String>) -> Self {
        ReconcileError::AlreadyExists {
            kind: kind.to_string(),
            name: name.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ReconcileError::InvalidRequest(message.into())
    }
}

impl From<RemoteError> for ReconcileError {
    fn from(err: RemoteError) -> Self {
        ReconcileError::InternalFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
