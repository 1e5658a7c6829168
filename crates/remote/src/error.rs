/// Errors surfaced by a remote store call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// The store refused a mutation because another resource still depends on the target.
    #[error("Conflict in {operation}: {message}")]
    Conflict { operation: String, message: String },

    #[error("Validation failed in {operation}: {message}")]
    Validation { operation: String, message: String },

    #[error("{operation} failed: {message}")]
    Service { operation: String, message: String },

    #[error("Remote client configuration error: {0}")]
    Config(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::Conflict { .. })
    }

    pub(crate) fn conflict(operation: &str, message: impl Into<String>) -> Self {
        RemoteError::Conflict {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn validation(operation: &str, message: impl Into<String>) -> Self {
        RemoteError::Validation {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
