use thiserror::Error;

/// Errors surfaced by the memory store, its gateway and its embedding providers.
///
/// Every variant is terminal for the call that produced it. Nothing in the
/// store retries; callers use [`MemoryError::is_retryable`] to decide.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Malformed input detected before any network call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedding backend rejected the call or returned an unusable payload.
    #[error("embedding backend error: {0}")]
    EmbeddingBackend(String),

    #[error("index '{0}' not found")]
    IndexNotFound(String),

    #[error("index '{0}' already exists")]
    IndexAlreadyExists(String),

    #[error("record '{id}' not found in index '{index}'")]
    RecordNotFound { index: String, id: String },

    /// Network-level failure (timeout, connection refused) talking to a backend.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Application-level failure reported by the vector database.
    #[error("backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    /// The vector database answered 2xx with a body we could not decode.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl MemoryError {
    /// True for the "absent" conditions that callers tolerating
    /// double-deletes may treat as a no-op.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MemoryError::IndexNotFound(_) | MemoryError::RecordNotFound { .. }
        )
    }

    /// True when repeating the same call later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            MemoryError::BackendUnavailable(_) => true,
            MemoryError::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_not_found_display() {
        let err = MemoryError::RecordNotFound {
            index: "Document".to_string(),
            id: "doc-001".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "record 'doc-001' not found in index 'Document'"
        );
    }

    #[test]
    fn test_not_found_classification() {
        assert!(MemoryError::IndexNotFound("a".into()).is_not_found());
        assert!(
            MemoryError::RecordNotFound {
                index: "a".into(),
                id: "b".into()
            }
            .is_not_found()
        );
        assert!(!MemoryError::IndexAlreadyExists("a".into()).is_not_found());
        assert!(!MemoryError::Cancelled.is_not_found());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(MemoryError::BackendUnavailable("timeout".into()).is_retryable());
        assert!(
            MemoryError::Backend {
                status: 503,
                message: "busy".into()
            }
            .is_retryable()
        );
        assert!(
            !MemoryError::Backend {
                status: 422,
                message: "bad".into()
            }
            .is_retryable()
        );
        assert!(!MemoryError::InvalidArgument("x".into()).is_retryable());
        assert!(!MemoryError::Cancelled.is_retryable());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid("dimension must be > 0".to_string());
        assert_eq!(err.to_string(), "invalid config: dimension must be > 0");
    }
}
